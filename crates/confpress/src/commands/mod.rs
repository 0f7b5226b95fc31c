//! CLI command implementations.

mod convert;
mod publish;

pub(crate) use convert::ConvertArgs;
pub(crate) use publish::PublishArgs;

use std::path::Path;

/// Page title fallback: the markdown file's stem.
pub(crate) fn default_title(markdown_file: &Path) -> String {
    markdown_file
        .file_stem()
        .map_or_else(|| "Untitled".to_owned(), |s| s.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_title_from_stem() {
        assert_eq!(default_title(Path::new("docs/release-notes.md")), "release-notes");
    }
}
