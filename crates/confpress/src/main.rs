//! Confpress CLI - Markdown to Confluence publishing.
//!
//! Provides commands for:
//! - `convert`: Convert a markdown file to storage format locally
//! - `publish`: Create or update a Confluence page from markdown

mod commands;
mod config;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ConvertArgs, PublishArgs};
use output::Output;

/// Confpress - Markdown to Confluence publishing.
#[derive(Parser)]
#[command(name = "confpress", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a markdown file to Confluence storage format locally.
    Convert(ConvertArgs),
    /// Publish a markdown file to a Confluence page.
    Publish(PublishArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let result = match cli.command {
        Commands::Convert(args) => args.execute(),
        Commands::Publish(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
