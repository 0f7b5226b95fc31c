//! Front matter stripping and page title extraction.
//!
//! Both functions operate on the original, unconverted markdown and are
//! independent of the conversion pipeline; callers use them to derive a page
//! title before converting.

/// Front matter delimiter line.
const DELIMITER: &str = "---";

/// Locate a leading front matter block.
///
/// Returns `(inner, body_start)`: the text between the delimiter lines and
/// the byte offset where the document body begins.
fn front_matter_span(document: &str) -> Option<(&str, usize)> {
    let first_end = document.find('\n')?;
    if document[..first_end].trim_end() != DELIMITER {
        return None;
    }

    let inner_start = first_end + 1;
    let mut pos = inner_start;
    while pos < document.len() {
        let line_end = document[pos..]
            .find('\n')
            .map_or(document.len(), |i| pos + i);
        if document[pos..line_end].trim_end() == DELIMITER {
            let body_start = if line_end < document.len() {
                line_end + 1
            } else {
                line_end
            };
            return Some((&document[inner_start..pos], body_start));
        }
        pos = if line_end < document.len() {
            line_end + 1
        } else {
            line_end
        };
    }

    // Unterminated block is not front matter
    None
}

/// Strip a leading front matter block, delimiter lines included.
///
/// No-op when the document does not start with a `---` line or the block is
/// unterminated. Stripping is idempotent.
#[must_use]
pub fn remove_front_matter(document: &str) -> &str {
    match front_matter_span(document) {
        Some((_, body_start)) => &document[body_start..],
        None => document,
    }
}

/// Derive a page title from a markdown document.
///
/// Precedence: `title:` field in leading front matter (quotes stripped),
/// then the first top-level `#` heading, then the supplied fallback.
#[must_use]
pub fn extract_title(document: &str, fallback: &str) -> String {
    if let Some((inner, _)) = front_matter_span(document) {
        for line in inner.lines() {
            if let Some(value) = line.strip_prefix("title:") {
                return unquote(value.trim()).to_owned();
            }
        }
    }

    // Lines inside fenced code blocks are not headings
    let mut in_fence = false;
    for line in document.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(heading) = line.strip_prefix("# ") {
            return heading.trim().to_owned();
        }
    }

    fallback.to_owned()
}

/// Strip one pair of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    let stripped = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')));
    stripped.unwrap_or(value)
}
