//! `confpress convert` command implementation.

use std::path::PathBuf;

use clap::Args;
use confpress_core::{KrokiClient, MarkdownConverter, extract_title, remove_front_matter};

use crate::commands::default_title;
use crate::config::resolve_kroki_url;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Path to the markdown file.
    markdown_file: PathBuf,

    /// Directory to write the storage-format markup and rendered diagrams.
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Kroki server URL for diagram rendering (overrides KROKI_URL).
    #[arg(long)]
    kroki_url: Option<String>,
}

impl ConvertArgs {
    /// Execute the convert command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let markdown_text = std::fs::read_to_string(&self.markdown_file)?;
        output.info(&format!("Converting {}...", self.markdown_file.display()));

        let title = extract_title(&markdown_text, &default_title(&self.markdown_file));
        let body = remove_front_matter(&markdown_text);

        let kroki = KrokiClient::new(&resolve_kroki_url(self.kroki_url.as_deref()));
        let result = MarkdownConverter::new().convert(body, &kroki);

        for warning in &result.warnings {
            output.warning(&format!("Warning: {warning}"));
        }

        std::fs::create_dir_all(&self.out_dir)?;
        let stem = default_title(&self.markdown_file);
        let markup_path = self.out_dir.join(format!("{stem}.xhtml"));
        std::fs::write(&markup_path, &result.markup)?;

        for artifact in &result.artifacts {
            std::fs::write(self.out_dir.join(&artifact.filename), &artifact.bytes)?;
        }

        output.success(&format!(
            "Wrote {} and {} diagram(s)",
            markup_path.display(),
            result.artifacts.len()
        ));
        output.info(&format!("Title: {title}"));

        Ok(())
    }
}
