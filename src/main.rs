// src/main.rs
// =============================================================================
// Entry point of the offline-issues CLI.
//
// What happens here:
// 1. Set up logging (tracing events go to stderr, filtered by RUST_LOG)
// 2. Parse command-line arguments using clap
// 3. Run the export pipeline
// 4. Exit with 0 on success, 1 on any error
// =============================================================================

mod cli;
mod error;
mod export;
mod github;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use cli::Cli;

#[tokio::main]
async fn main() {
    init_logging();

    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so stdout only carries the summary lines.
// RUST_LOG overrides the default "info" level (e.g. RUST_LOG=debug).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Returns anyhow::Result: at this level we only need to print the error
// chain, not match on it
async fn run() -> Result<()> {
    // Parse arguments (clap exits with usage help on bad flags)
    let options = Cli::parse().into_options();

    println!("📥 Exporting issues from {} repository target(s)", options.repos.len());

    let summary = match export::run(&options).await {
        Ok(summary) => summary,
        Err(e) => {
            // Request and write failures say where in the run they happened
            if let Some(phase) = e.phase() {
                error!(%phase, "export aborted");
            }
            return Err(e.into());
        }
    };

    println!("📄 Exported {} issue(s) to {}", summary.issues, summary.dataset.display());
    println!("📝 Wrote Markdown files to {}", summary.markdown_dir.display());
    Ok(())
}
