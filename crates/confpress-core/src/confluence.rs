//! Confluence storage format renderer for pulldown-cmark events.

use std::fmt::Write;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Tag, TagEnd};

use crate::extractor::{ARTIFACT_PREFIX, DIGEST_LEN};

/// Language parameter value for untagged code blocks.
const FALLBACK_LANGUAGE: &str = "none";

/// Check whether an image target is a content-addressed diagram attachment.
///
/// This is the coupling point with the extractor: it recognizes exactly the
/// `mermaid-<12 hex>.png` filenames that [`crate::artifact_filename`] emits.
#[must_use]
pub fn is_artifact_filename(target: &str) -> bool {
    let Some(rest) = target.strip_prefix(ARTIFACT_PREFIX) else {
        return false;
    };
    let Some(rest) = rest.strip_prefix('-') else {
        return false;
    };
    let Some(digest) = rest.strip_suffix(".png") else {
        return false;
    };
    digest.len() == DIGEST_LEN
        && digest
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// Renders pulldown-cmark events to Confluence XHTML storage format.
pub struct ConfluenceRenderer {
    output: String,
    /// Whether we're inside a code block (text goes into CDATA unescaped).
    in_code_block: bool,
    /// Whether we're inside an image (alt text is dropped).
    in_image: bool,
    /// Whether we're inside the table header row.
    in_table_head: bool,
}

impl ConfluenceRenderer {
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            in_code_block: false,
            in_image: false,
            in_table_head: false,
        }
    }

    /// Render markdown events to Confluence storage format.
    ///
    /// Whitespace runs between adjacent tags are collapsed afterwards;
    /// text content and CDATA code bodies are left untouched.
    pub fn render<'a, I>(mut self, events: I) -> String
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }
        collapse_intertag_whitespace(&self.output)
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(&tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.output.push_str(&html),
            Event::SoftBreak => self.output.push('\n'),
            Event::HardBreak => self.output.push_str("<br />"),
            Event::Rule => self.output.push_str("<hr />"),
            Event::TaskListMarker(checked) => {
                if checked {
                    self.output.push_str("[x] ");
                } else {
                    self.output.push_str("[ ] ");
                }
            }
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported in Confluence
            }
        }
    }

    fn start_tag(&mut self, tag: &Tag<'_>) {
        // Inline markup inside alt text is dropped along with the text
        if self.in_image && is_inline_tag(tag) {
            return;
        }
        match tag {
            Tag::Paragraph => {
                if !self.in_code_block {
                    self.output.push_str("<p>");
                }
            }
            Tag::Heading { level, .. } => {
                let _ = write!(self.output, "<h{}>", heading_level_to_num(*level));
            }
            Tag::BlockQuote(_) => {
                self.output.push_str(
                    r#"<ac:structured-macro ac:name="info" ac:schema-version="1"><ac:rich-text-body>"#,
                );
            }
            Tag::CodeBlock(kind) => {
                self.in_code_block = true;
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => {
                        lang.split_whitespace().next().unwrap_or(FALLBACK_LANGUAGE)
                    }
                    _ => FALLBACK_LANGUAGE,
                };

                self.output
                    .push_str(r#"<ac:structured-macro ac:name="code" ac:schema-version="1">"#);
                let _ = write!(
                    self.output,
                    r#"<ac:parameter ac:name="language">{}</ac:parameter>"#,
                    escape_xml(lang)
                );
                self.output
                    .push_str(r#"<ac:parameter ac:name="collapse">false</ac:parameter>"#);
                self.output.push_str(r"<ac:plain-text-body><![CDATA[");
            }
            Tag::List(start) => {
                if start.is_some() {
                    self.output.push_str("<ol>");
                } else {
                    self.output.push_str("<ul>");
                }
            }
            Tag::Item => self.output.push_str("<li>"),
            Tag::Table(_alignments) => self.output.push_str("<table><tbody>"),
            Tag::TableHead => {
                self.in_table_head = true;
                self.output.push_str("<tr>");
            }
            Tag::TableRow => self.output.push_str("<tr>"),
            Tag::TableCell => {
                if self.in_table_head {
                    self.output.push_str("<th>");
                } else {
                    self.output.push_str("<td>");
                }
            }
            Tag::Emphasis => self.output.push_str("<em>"),
            Tag::Strong => self.output.push_str("<strong>"),
            Tag::Strikethrough => self.output.push_str("<s>"),
            Tag::Superscript => self.output.push_str("<sup>"),
            Tag::Subscript => self.output.push_str("<sub>"),
            Tag::Link { dest_url, .. } => {
                let _ = write!(self.output, r#"<a href="{}">"#, escape_xml(dest_url));
            }
            Tag::Image { dest_url, .. } => {
                self.in_image = true;
                if is_artifact_filename(dest_url) {
                    // Rendered diagram, referenced as page attachment
                    let _ = write!(
                        self.output,
                        r#"<ac:image><ri:attachment ri:filename="{}" /></ac:image>"#,
                        escape_xml(dest_url)
                    );
                } else {
                    let _ = write!(
                        self.output,
                        r#"<ac:image><ri:url ri:value="{}" /></ac:image>"#,
                        escape_xml(dest_url)
                    );
                }
            }
            Tag::FootnoteDefinition(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::HtmlBlock
            | Tag::MetadataBlock(_) => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        if self.in_image && is_inline_tag_end(tag) {
            return;
        }
        match tag {
            TagEnd::Paragraph => {
                if !self.in_code_block {
                    self.output.push_str("</p>");
                }
            }
            TagEnd::Heading(level) => {
                let _ = write!(self.output, "</h{}>", heading_level_to_num(level));
            }
            TagEnd::BlockQuote(_) => {
                self.output
                    .push_str("</ac:rich-text-body></ac:structured-macro>");
            }
            TagEnd::CodeBlock => {
                self.output
                    .push_str("]]></ac:plain-text-body></ac:structured-macro>");
                self.in_code_block = false;
            }
            TagEnd::List(ordered) => {
                if ordered {
                    self.output.push_str("</ol>");
                } else {
                    self.output.push_str("</ul>");
                }
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.in_table_head = false;
                self.output.push_str("</tr>");
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                if self.in_table_head {
                    self.output.push_str("</th>");
                } else {
                    self.output.push_str("</td>");
                }
            }
            TagEnd::Emphasis => self.output.push_str("</em>"),
            TagEnd::Strong => self.output.push_str("</strong>"),
            TagEnd::Strikethrough => self.output.push_str("</s>"),
            TagEnd::Superscript => self.output.push_str("</sup>"),
            TagEnd::Subscript => self.output.push_str("</sub>"),
            TagEnd::Link => self.output.push_str("</a>"),
            TagEnd::Image => {
                // Image is self-closing in start_tag
                self.in_image = false;
            }
            TagEnd::FootnoteDefinition
            | TagEnd::DefinitionList
            | TagEnd::DefinitionListTitle
            | TagEnd::DefinitionListDefinition
            | TagEnd::HtmlBlock
            | TagEnd::MetadataBlock(_) => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_image {
            // Alt text already consumed by the image construct
            return;
        }
        if self.in_code_block {
            // CDATA body, verbatim except for the CDATA terminator
            self.output.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
        } else {
            self.output.push_str(&escape_xml(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.in_image {
            return;
        }
        let _ = write!(self.output, "<code>{}</code>", escape_xml(code));
    }
}

fn is_inline_tag(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Emphasis
            | Tag::Strong
            | Tag::Strikethrough
            | Tag::Superscript
            | Tag::Subscript
            | Tag::Link { .. }
    )
}

fn is_inline_tag_end(tag: TagEnd) -> bool {
    matches!(
        tag,
        TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Superscript
            | TagEnd::Subscript
            | TagEnd::Link
    )
}

impl Default for ConfluenceRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

/// Remove whitespace runs that sit strictly between two tags.
///
/// CDATA sections are copied verbatim so code bodies keep their whitespace.
fn collapse_intertag_whitespace(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        if input[i..].starts_with("<![CDATA[") {
            let end = input[i..].find("]]>").map_or(input.len(), |j| i + j + 3);
            out.push_str(&input[i..end]);
            i = end;
            continue;
        }

        if bytes[i].is_ascii_whitespace() && out.ends_with('>') {
            let mut j = i;
            while j < input.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < input.len() && bytes[j] == b'<' {
                i = j;
                continue;
            }
        }

        let Some(c) = input[i..].chars().next() else {
            break;
        };
        out.push(c);
        i += c.len_utf8();
    }

    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use pulldown_cmark::{Options, Parser};

    use super::*;
    use crate::extractor::artifact_filename;

    fn render(markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        let parser = Parser::new_ext(markdown, options);
        ConfluenceRenderer::new().render(parser)
    }

    #[test]
    fn test_basic_paragraph() {
        assert_eq!(render("Hello, world!"), "<p>Hello, world!</p>");
    }

    #[test]
    fn test_heading() {
        assert_eq!(render("# Title"), "<h1>Title</h1>");
    }

    #[test]
    fn test_heading_and_paragraph() {
        assert_eq!(render("# Hi\n\nplain text"), "<h1>Hi</h1><p>plain text</p>");
    }

    #[test]
    fn test_code_block_with_language() {
        let result = render("```python\nprint('hello')\n```");
        assert!(result.contains(r#"ac:name="code""#));
        assert!(result.contains(r#"<ac:parameter ac:name="language">python</ac:parameter>"#));
        assert!(result.contains(r#"<ac:parameter ac:name="collapse">false</ac:parameter>"#));
        assert!(result.contains("<![CDATA[print('hello')\n]]>"));
    }

    #[test]
    fn test_code_block_without_language_uses_fallback() {
        let result = render("```\nraw text\n```");
        assert!(result.contains(r#"<ac:parameter ac:name="language">none</ac:parameter>"#));
    }

    #[test]
    fn test_code_block_body_not_escaped() {
        let result = render("```xml\n<a href=\"x\">&amp;</a>\n```");
        assert!(result.contains("<![CDATA[<a href=\"x\">&amp;</a>\n]]>"));
    }

    #[test]
    fn test_code_block_cdata_terminator_escaped() {
        let result = render("```text\na ]]> b\n```");
        assert!(result.contains("a ]]]]><![CDATA[> b"));
    }

    #[test]
    fn test_attachment_image() {
        let filename = artifact_filename("A-->B");
        let result = render(&format!("![]({filename})"));
        assert!(result.contains(&format!(
            r#"<ac:image><ri:attachment ri:filename="{filename}" /></ac:image>"#
        )));
        assert!(!result.contains("ri:url"));
    }

    #[test]
    fn test_external_image() {
        let result = render("![alt](https://example.com/pic.png)");
        assert!(result.contains(
            r#"<ac:image><ri:url ri:value="https://example.com/pic.png" /></ac:image>"#
        ));
        assert!(!result.contains("ri:attachment"));
        // Alt text must not leak into the output
        assert!(!result.contains("alt"));
    }

    #[test]
    fn test_link() {
        assert_eq!(
            render("[docs](https://example.com)"),
            r#"<p><a href="https://example.com">docs</a></p>"#
        );
    }

    #[test]
    fn test_blockquote() {
        let result = render("> Note");
        assert!(result.contains(r#"ac:name="info""#));
        assert!(result.contains("<ac:rich-text-body>"));
    }

    #[test]
    fn test_lists_and_task_markers() {
        let result = render("- [x] done\n- [ ] open\n");
        assert!(result.contains("<ul><li>[x] done</li><li>[ ] open</li></ul>"));
    }

    #[test]
    fn test_ordered_list() {
        assert_eq!(render("1. a\n2. b\n"), "<ol><li>a</li><li>b</li></ol>");
    }

    #[test]
    fn test_table_with_header() {
        let result = render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(result.contains("<table><tbody><tr><th>a</th><th>b</th></tr>"));
        assert!(result.contains("<tr><td>1</td><td>2</td></tr></tbody></table>"));
    }

    #[test]
    fn test_emphasis_strikethrough_rule() {
        let result = render("*em* **strong** ~~gone~~\n\n---\n");
        assert!(result.contains("<em>em</em>"));
        assert!(result.contains("<strong>strong</strong>"));
        assert!(result.contains("<s>gone</s>"));
        assert!(result.contains("<hr />"));
    }

    #[test]
    fn test_superscript_and_subscript() {
        let events = vec![
            Event::Start(Tag::Paragraph),
            Event::Text("E=mc".into()),
            Event::Start(Tag::Superscript),
            Event::Text("2".into()),
            Event::End(TagEnd::Superscript),
            Event::Text(" H".into()),
            Event::Start(Tag::Subscript),
            Event::Text("2".into()),
            Event::End(TagEnd::Subscript),
            Event::Text("O".into()),
            Event::End(TagEnd::Paragraph),
        ];
        assert_eq!(
            ConfluenceRenderer::new().render(events.into_iter()),
            "<p>E=mc<sup>2</sup> H<sub>2</sub>O</p>"
        );
    }

    #[test]
    fn test_image_alt_markup_suppressed() {
        let result = render("![a *b* `c`](https://example.com/p.png)");
        assert_eq!(
            result,
            r#"<p><ac:image><ri:url ri:value="https://example.com/p.png" /></ac:image></p>"#
        );
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(render("a < b & c"), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn test_is_artifact_filename() {
        assert!(is_artifact_filename("mermaid-0123456789ab.png"));
        assert!(is_artifact_filename(&artifact_filename("A-->B")));
        assert!(!is_artifact_filename("mermaid-0123456789ab.svg"));
        assert!(!is_artifact_filename("mermaid-0123.png"));
        assert!(!is_artifact_filename("mermaid-0123456789AB.png"));
        assert!(!is_artifact_filename("diagram-0123456789ab.png"));
        assert!(!is_artifact_filename("https://example.com/a.png"));
    }

    #[test]
    fn test_collapse_intertag_whitespace() {
        assert_eq!(
            collapse_intertag_whitespace("<p>a</p>\n\n<p>b</p>"),
            "<p>a</p><p>b</p>"
        );
        // Whitespace next to text content stays
        assert_eq!(
            collapse_intertag_whitespace("<p>a b</p> text <p>c</p>"),
            "<p>a b</p> text <p>c</p>"
        );
        // CDATA bodies keep their whitespace
        let cdata = "<ac:plain-text-body><![CDATA[a >\n\n< b]]></ac:plain-text-body>";
        assert_eq!(collapse_intertag_whitespace(cdata), cdata);
    }
}
