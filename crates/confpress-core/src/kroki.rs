//! Mermaid rendering via the Kroki HTTP service.

use std::time::Duration;

use tracing::debug;
use ureq::Agent;

/// Default Kroki server URL.
pub const DEFAULT_KROKI_URL: &str = "https://kroki.io";

/// Default HTTP timeout for render requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// PNG file signature.
const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Error from a single diagram render attempt.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// HTTP transport error (connection refused, timeout, etc).
    #[error("HTTP request failed: {0}")]
    Http(String),
    /// Server returned an error status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details from the renderer).
        body: String,
    },
    /// Response body was not a PNG image.
    #[error("response is not valid PNG data")]
    InvalidPng,
}

/// Renders diagram source to raw image bytes.
///
/// The extractor is generic over this trait so tests can substitute a fake
/// renderer instead of a live Kroki server.
pub trait DiagramRenderer {
    /// Render the given diagram source, returning raw PNG bytes.
    fn render(&self, source: &str) -> Result<Vec<u8>, RenderError>;
}

/// Kroki client rendering mermaid sources to PNG.
pub struct KrokiClient {
    agent: Agent,
    server_url: String,
}

impl KrokiClient {
    /// Create a client for the given Kroki server URL.
    #[must_use]
    pub fn new(server_url: &str) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(DEFAULT_TIMEOUT))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            server_url: server_url.trim_end_matches('/').to_owned(),
        }
    }
}

impl Default for KrokiClient {
    fn default() -> Self {
        Self::new(DEFAULT_KROKI_URL)
    }
}

impl DiagramRenderer for KrokiClient {
    fn render(&self, source: &str) -> Result<Vec<u8>, RenderError> {
        let url = format!("{}/mermaid/png", self.server_url);
        debug!("Rendering {} byte diagram via {}", source.len(), url);

        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "text/plain")
            .send(source.as_bytes())
            .map_err(|e| RenderError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            return Err(RenderError::Status {
                status,
                body: error_body,
            });
        }

        let data = body
            .read_to_vec()
            .map_err(|e| RenderError::Http(e.to_string()))?;

        if !data.starts_with(PNG_SIGNATURE) {
            return Err(RenderError::InvalidPng);
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_trailing_slash() {
        let client = KrokiClient::new("https://kroki.example.com/");
        assert_eq!(client.server_url, "https://kroki.example.com");
    }

    #[test]
    fn test_render_error_display() {
        let err = RenderError::Status {
            status: 400,
            body: "syntax error".to_owned(),
        };
        assert_eq!(err.to_string(), "HTTP 400: syntax error");
    }
}
