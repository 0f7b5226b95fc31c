//! Environment-variable configuration.

use confpress_core::DEFAULT_KROKI_URL;

/// Confluence server base URL.
const ENV_BASE_URL: &str = "CONFLUENCE_BASE_URL";

/// Confluence personal access token.
const ENV_API_TOKEN: &str = "CONFLUENCE_API_TOKEN";

/// Kroki server URL (optional, defaults to the public instance).
const ENV_KROKI_URL: &str = "KROKI_URL";

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    /// A required environment variable is not set.
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
}

/// Confluence connection settings read from the environment.
#[derive(Debug)]
pub(crate) struct ConfluenceSettings {
    pub(crate) base_url: String,
    pub(crate) api_token: String,
}

impl ConfluenceSettings {
    /// Read settings from `CONFLUENCE_BASE_URL` and `CONFLUENCE_API_TOKEN`.
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: require(ENV_BASE_URL)?,
            api_token: require(ENV_API_TOKEN)?,
        })
    }
}

/// Resolve the Kroki server URL: CLI flag, then `KROKI_URL`, then default.
pub(crate) fn resolve_kroki_url(flag: Option<&str>) -> String {
    if let Some(url) = flag {
        return url.to_owned();
    }
    std::env::var(ENV_KROKI_URL).unwrap_or_else(|_| DEFAULT_KROKI_URL.to_owned())
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}
