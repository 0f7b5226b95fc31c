//! Space/page URL parsing.

use percent_encoding::percent_decode_str;

/// Where a published page lives, parsed from a Confluence URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLocator {
    /// A concrete page ID.
    Id(String),
    /// A space key plus page title (resolved via search at publish time).
    SpaceTitle {
        /// Space key.
        space: String,
        /// Page title.
        title: String,
    },
}

/// Error parsing a page URL.
#[derive(Debug, thiserror::Error)]
#[error("unrecognized Confluence page URL: {url}")]
pub struct LocatorError {
    /// The URL that failed to parse.
    pub url: String,
}

impl PageLocator {
    /// Parse a Confluence page URL.
    ///
    /// Recognized forms:
    /// - `...?pageId=12345`
    /// - `.../spaces/SPACE/pages/12345/Page+Title` (cloud)
    /// - `.../display/SPACE/Page+Title` (server)
    pub fn parse(url: &str) -> Result<Self, LocatorError> {
        if let Some(idx) = url.find("pageId=") {
            let id: String = url[idx + "pageId=".len()..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if !id.is_empty() {
                return Ok(Self::Id(id));
            }
        }

        let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
        let path = without_scheme
            .split_once('?')
            .map_or(without_scheme, |(p, _)| p);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        for (i, segment) in segments.iter().enumerate() {
            match *segment {
                // /spaces/SPACE/pages/12345/Title
                "spaces" if segments.get(i + 2) == Some(&"pages") => {
                    if let Some(id) = segments.get(i + 3)
                        && id.chars().all(|c| c.is_ascii_digit())
                        && !id.is_empty()
                    {
                        return Ok(Self::Id((*id).to_owned()));
                    }
                }
                // /display/SPACE/Title
                "display" => {
                    if let (Some(space), Some(title)) = (segments.get(i + 1), segments.get(i + 2)) {
                        return Ok(Self::SpaceTitle {
                            space: (*space).to_owned(),
                            title: decode_title(title),
                        });
                    }
                }
                _ => {}
            }
        }

        Err(LocatorError {
            url: url.to_owned(),
        })
    }
}

/// Decode a title path segment (`+` and percent escapes become text).
fn decode_title(segment: &str) -> String {
    let plus_decoded = segment.replace('+', " ");
    percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_page_id_query() {
        let locator =
            PageLocator::parse("https://wiki.example.com/pages/viewpage.action?pageId=12345")
                .unwrap();
        assert_eq!(locator, PageLocator::Id("12345".to_owned()));
    }

    #[test]
    fn test_parse_cloud_url() {
        let locator =
            PageLocator::parse("https://example.atlassian.net/wiki/spaces/DOC/pages/98765/My+Page")
                .unwrap();
        assert_eq!(locator, PageLocator::Id("98765".to_owned()));
    }

    #[test]
    fn test_parse_display_url() {
        let locator = PageLocator::parse("https://wiki.example.com/display/DOC/My+Page").unwrap();
        assert_eq!(
            locator,
            PageLocator::SpaceTitle {
                space: "DOC".to_owned(),
                title: "My Page".to_owned(),
            }
        );
    }

    #[test]
    fn test_parse_display_url_percent_encoded() {
        let locator =
            PageLocator::parse("https://wiki.example.com/display/DOC/Caf%C3%A9+Notes").unwrap();
        assert_eq!(
            locator,
            PageLocator::SpaceTitle {
                space: "DOC".to_owned(),
                title: "Café Notes".to_owned(),
            }
        );
    }

    #[test]
    fn test_parse_unrecognized_url() {
        let err = PageLocator::parse("https://wiki.example.com/whatever").unwrap_err();
        assert!(err.to_string().contains("unrecognized"));
    }
}
