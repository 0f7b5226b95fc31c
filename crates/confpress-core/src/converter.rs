//! Markdown to Confluence converter.

use pulldown_cmark::{Options, Parser};

use crate::confluence::ConfluenceRenderer;
use crate::extractor::{Artifact, DiagramExtractor};
use crate::kroki::DiagramRenderer;

/// Result of converting markdown to Confluence storage format.
#[derive(Debug)]
pub struct ConversionResult {
    /// Storage-format markup ready for the page body.
    pub markup: String,
    /// Rendered diagram attachments in document order.
    pub artifacts: Vec<Artifact>,
    /// Diagnostics for diagrams that degraded to plain code blocks.
    pub warnings: Vec<String>,
}

/// Markdown to Confluence converter configuration.
#[derive(Clone, Debug)]
pub struct MarkdownConverter {
    gfm: bool,
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownConverter {
    /// Create a new converter with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self { gfm: true }
    }

    /// Enable or disable GitHub Flavored Markdown features.
    #[must_use]
    pub fn gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        if self.gfm {
            options.insert(Options::ENABLE_TABLES);
            options.insert(Options::ENABLE_STRIKETHROUGH);
            options.insert(Options::ENABLE_TASKLISTS);
        }
        options
    }

    /// Convert markdown to Confluence storage format.
    ///
    /// Mermaid blocks are rendered through `renderer` first; the rewritten
    /// document is then translated to storage format. Failed diagram renders
    /// degrade to ordinary code blocks and are listed in
    /// [`ConversionResult::warnings`]; this method never fails.
    #[must_use]
    pub fn convert<R: DiagramRenderer + Sync>(
        &self,
        markdown_text: &str,
        renderer: &R,
    ) -> ConversionResult {
        let extracted = DiagramExtractor::new(renderer).extract(markdown_text);

        let parser = Parser::new_ext(&extracted.document, self.parser_options());
        let markup = ConfluenceRenderer::new().render(parser);

        ConversionResult {
            markup,
            artifacts: extracted.artifacts,
            warnings: extracted.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::extractor::artifact_filename;
    use crate::kroki::RenderError;

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake";

    struct FakeRenderer {
        fail: bool,
    }

    impl DiagramRenderer for FakeRenderer {
        fn render(&self, _source: &str) -> Result<Vec<u8>, RenderError> {
            if self.fail {
                Err(RenderError::Status {
                    status: 502,
                    body: "bad gateway".to_owned(),
                })
            } else {
                Ok(PNG_BYTES.to_vec())
            }
        }
    }

    #[test]
    fn test_plain_document() {
        let converter = MarkdownConverter::new();
        let result = converter.convert("# Hi\n\nplain text", &FakeRenderer { fail: false });

        assert_eq!(result.markup, "<h1>Hi</h1><p>plain text</p>");
        assert!(result.artifacts.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_diagram_rendered_as_attachment_image() {
        let converter = MarkdownConverter::new();
        let input = "```mermaid\nflowchart LR\nA-->B\n```\n";

        let result = converter.convert(input, &FakeRenderer { fail: false });

        let filename = artifact_filename("flowchart LR\nA-->B");
        assert_eq!(
            result.markup,
            format!(r#"<p><ac:image><ri:attachment ri:filename="{filename}" /></ac:image></p>"#)
        );
        assert_eq!(result.artifacts.len(), 1);
        assert_eq!(result.artifacts[0].filename, filename);
        assert_eq!(result.artifacts[0].bytes, PNG_BYTES);
    }

    #[test]
    fn test_failed_diagram_degrades_to_code_block() {
        let converter = MarkdownConverter::new();
        let input = "```mermaid\nflowchart LR\nA-->B\n```\n";

        let result = converter.convert(input, &FakeRenderer { fail: true });

        assert!(result.markup.contains(r#"ac:name="code""#));
        assert!(
            result
                .markup
                .contains(r#"<ac:parameter ac:name="language">mermaid</ac:parameter>"#)
        );
        assert!(result.markup.contains("flowchart LR"));
        assert!(!result.markup.contains("ri:attachment"));
        assert!(result.artifacts.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_markup_references_match_artifacts() {
        let converter = MarkdownConverter::new();
        let input = "```mermaid\nA-->B\n```\n\n```mermaid\nC-->D\n```\n\n```mermaid\nA-->B\n```\n";

        let result = converter.convert(input, &FakeRenderer { fail: false });

        // Three references, two unique artifacts.
        assert_eq!(result.markup.matches("ri:attachment").count(), 3);
        assert_eq!(result.artifacts.len(), 2);
        for artifact in &result.artifacts {
            assert!(result.markup.contains(&artifact.filename));
        }
    }

    #[test]
    fn test_non_diagram_code_block_untouched() {
        let converter = MarkdownConverter::new();
        let result = converter.convert(
            "```rust\nfn main() {}\n```\n",
            &FakeRenderer { fail: false },
        );

        assert!(
            result
                .markup
                .contains(r#"<ac:parameter ac:name="language">rust</ac:parameter>"#)
        );
        assert!(result.artifacts.is_empty());
    }
}
