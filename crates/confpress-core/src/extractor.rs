//! Mermaid fence extraction and document rewriting.
//!
//! Scans raw markdown text for ```` ```mermaid ```` fenced blocks, renders
//! each via a [`DiagramRenderer`], and rewrites matched spans with image
//! references to content-addressed attachment filenames. Rendering happens
//! in parallel on the rayon pool; the rewrite is a single forward pass over
//! precomputed spans so offsets of later blocks never shift.

use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::kroki::{DiagramRenderer, RenderError};

/// Fence info tag marking a mermaid diagram block.
const DIAGRAM_MARKER: &str = "```mermaid";

/// Filename prefix for rendered diagram attachments.
pub(crate) const ARTIFACT_PREFIX: &str = "mermaid";

/// Number of hex digest characters in an artifact filename.
pub(crate) const DIGEST_LEN: usize = 12;

/// A named binary attachment produced by diagram rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Content-addressed filename (`mermaid-<hash>.png`).
    pub filename: String,
    /// Raw PNG bytes.
    pub bytes: Vec<u8>,
}

/// Result of extracting and rendering diagrams from a document.
#[derive(Debug)]
pub struct ExtractResult {
    /// Rewritten markdown with successful blocks replaced by image references.
    pub document: String,
    /// Rendered artifacts in document order, one per unique source.
    pub artifacts: Vec<Artifact>,
    /// Per-block render failures (the blocks themselves are left verbatim).
    pub warnings: Vec<String>,
}

/// A located mermaid block: byte span plus canonical (trimmed) source.
#[derive(Debug)]
struct DiagramBlock {
    /// Offset of the opening fence line.
    start: usize,
    /// Offset just past the closing fence text (its newline is kept).
    end: usize,
    source: String,
}

/// Compute the content-addressed attachment filename for a diagram source.
///
/// Identical sources always map to the same filename, so re-uploading an
/// unchanged diagram overwrites the existing attachment instead of piling
/// up copies.
#[must_use]
pub fn artifact_filename(source: &str) -> String {
    let digest = Sha256::digest(source.as_bytes());
    let hash = hex::encode(digest);
    format!("{ARTIFACT_PREFIX}-{}.png", &hash[..DIGEST_LEN])
}

/// Extracts mermaid blocks from markdown and renders them via Kroki.
pub struct DiagramExtractor<'a, R> {
    renderer: &'a R,
}

impl<'a, R: DiagramRenderer + Sync> DiagramExtractor<'a, R> {
    /// Create an extractor using the given renderer.
    pub fn new(renderer: &'a R) -> Self {
        Self { renderer }
    }

    /// Extract all mermaid blocks, render them, and rewrite the document.
    ///
    /// Blocks whose render fails are left untouched (they fall through to
    /// the translator as ordinary code blocks) and reported in `warnings`;
    /// a single bad diagram never aborts the conversion.
    #[must_use]
    pub fn extract(&self, document: &str) -> ExtractResult {
        let blocks = scan_blocks(document);
        if blocks.is_empty() {
            return ExtractResult {
                document: document.to_owned(),
                artifacts: Vec::new(),
                warnings: Vec::new(),
            };
        }

        // One request per block, even for duplicate sources. par_iter
        // preserves input order in the collected results.
        let results: Vec<Result<Vec<u8>, RenderError>> = blocks
            .par_iter()
            .map(|b| self.renderer.render(&b.source))
            .collect();

        let mut out = String::with_capacity(document.len());
        let mut artifacts: Vec<Artifact> = Vec::new();
        let mut warnings = Vec::new();
        let mut cursor = 0;

        for (index, (block, result)) in blocks.iter().zip(results).enumerate() {
            match result {
                Ok(bytes) => {
                    let filename = artifact_filename(&block.source);
                    out.push_str(&document[cursor..block.start]);
                    out.push_str(&format!("![]({filename})"));
                    cursor = block.end;

                    // First occurrence wins for duplicate sources.
                    if !artifacts.iter().any(|a| a.filename == filename) {
                        artifacts.push(Artifact { filename, bytes });
                    }
                }
                Err(err) => {
                    warn!("Diagram {index} failed to render: {err}");
                    warnings.push(format!("diagram {index}: {err}"));
                }
            }
        }
        out.push_str(&document[cursor..]);

        ExtractResult {
            document: out,
            artifacts,
            warnings,
        }
    }
}

/// Scan for mermaid fences, greedy and non-overlapping, left to right.
///
/// An opening fence is a line that is exactly ```` ```mermaid ```` after
/// trailing-whitespace trim; the closing fence is the next line that is
/// exactly `` ``` ``. An unterminated fence matches nothing.
fn scan_blocks(document: &str) -> Vec<DiagramBlock> {
    let mut blocks = Vec::new();
    // (fence line start, inner content start)
    let mut open: Option<(usize, usize)> = None;
    let mut pos = 0;

    while pos < document.len() {
        let line_end = document[pos..]
            .find('\n')
            .map_or(document.len(), |i| pos + i);
        let line = &document[pos..line_end];
        let next = if line_end < document.len() {
            line_end + 1
        } else {
            line_end
        };

        match open {
            None => {
                if line.trim_end() == DIAGRAM_MARKER {
                    open = Some((pos, next));
                }
            }
            Some((fence_start, content_start)) => {
                if line.trim_end() == "```" {
                    blocks.push(DiagramBlock {
                        start: fence_start,
                        end: line_end,
                        source: document[content_start..pos].trim().to_owned(),
                    });
                    open = None;
                }
            }
        }

        pos = next;
    }

    blocks
}
