//! Markdown to Confluence conversion for confpress.
//!
//! This crate implements the conversion pipeline in two stages:
//! - [`DiagramExtractor`] scans raw markdown for ```` ```mermaid ```` fences,
//!   renders each via Kroki, and rewrites the document with attachment image
//!   references.
//! - [`ConfluenceRenderer`] parses the rewritten markdown with pulldown-cmark
//!   and serializes it to Confluence storage format.
//!
//! The stages compose strictly in sequence; the renderer never touches the
//! network. [`MarkdownConverter`] ties them together and always returns a
//! [`ConversionResult`]: a failed diagram render degrades that block to
//! inert code and is reported as a warning, never as a fatal error.

mod confluence;
mod converter;
mod extractor;
mod frontmatter;
mod kroki;

pub use confluence::{ConfluenceRenderer, is_artifact_filename};
pub use converter::{ConversionResult, MarkdownConverter};
pub use extractor::{Artifact, DiagramExtractor, ExtractResult, artifact_filename};
pub use frontmatter::{extract_title, remove_front_matter};
pub use kroki::{DEFAULT_KROKI_URL, DiagramRenderer, KrokiClient, RenderError};
