//! `confpress publish` command implementation.

use std::path::PathBuf;

use clap::Args;
use confpress_confluence::{ConfluenceClient, PageLocator, PagePublisher, PublishResult};
use confpress_core::{KrokiClient, MarkdownConverter, extract_title, remove_front_matter};

use crate::commands::default_title;
use crate::config::{ConfluenceSettings, resolve_kroki_url};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the publish command.
#[derive(Args)]
pub(crate) struct PublishArgs {
    /// Path to the markdown file.
    markdown_file: PathBuf,

    /// Confluence page URL (display, cloud, or pageId form).
    page_url: String,

    /// Page title (default: front matter title, first heading, or file stem).
    #[arg(short, long)]
    title: Option<String>,

    /// Version message for the update.
    #[arg(short, long)]
    message: Option<String>,

    /// Kroki server URL for diagram rendering (overrides KROKI_URL).
    #[arg(long)]
    kroki_url: Option<String>,
}

impl PublishArgs {
    /// Execute the publish command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let settings = ConfluenceSettings::from_env()?;
        let locator = PageLocator::parse(&self.page_url)?;

        let markdown_text = std::fs::read_to_string(&self.markdown_file)?;
        output.info(&format!("Converting {}...", self.markdown_file.display()));

        let title = self.title.clone().unwrap_or_else(|| {
            extract_title(&markdown_text, &default_title(&self.markdown_file))
        });
        let body = remove_front_matter(&markdown_text);

        let kroki = KrokiClient::new(&resolve_kroki_url(self.kroki_url.as_deref()));
        let result = MarkdownConverter::new().convert(body, &kroki);

        for warning in &result.warnings {
            output.warning(&format!("Warning: {warning}"));
        }

        let client = ConfluenceClient::new(&settings.base_url, &settings.api_token);
        let publisher = PagePublisher::new(&client);
        let published = publisher.publish(
            &locator,
            &title,
            &result.markup,
            &result.artifacts,
            self.message.as_deref(),
        )?;

        print_publish_result(&output, &published);

        Ok(())
    }
}

fn print_publish_result(output: &Output, result: &PublishResult) {
    if result.created {
        output.success("\nPage created successfully!");
    } else {
        output.success("\nPage updated successfully!");
    }
    output.info(&format!("ID: {}", result.page.id));
    output.info(&format!("Title: {}", result.page.title));
    output.info(&format!("Version: {}", result.page.version.number));
    output.info(&format!("URL: {}", result.url));

    if result.attachments_uploaded > 0 {
        output.info(&format!(
            "Attachments uploaded: {}",
            result.attachments_uploaded
        ));
    }
}
