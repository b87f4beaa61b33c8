// src/export/mod.rs
// =============================================================================
// The export pipeline.
//
// For every repository target:
//   all-mode    -> list_issues (paginated) -> enrich_all (bounded fan-out)
//   single-mode -> fetch_issue             -> enrich
//
// Repositories run concurrently, each with its own buffers. Once every
// repository has finished, the combined dataset is written as JSON and then
// rendered to Markdown. The first error anywhere aborts the run.
// =============================================================================

mod comments;
mod record;

use std::path::PathBuf;
use std::time::Duration;

use futures::future::try_join_all;
use tracing::info;

use crate::error::ExportError;
use crate::github::{self, GithubClient, IssueSelection, RepoTarget};
use crate::output::{self, MarkdownRenderer};

pub use comments::{enrich, enrich_all};
pub use record::IssueRecord;

// Tests elsewhere build comments directly
#[cfg(test)]
pub use record::CommentRecord;

/// Everything one run needs.
///
/// Built from the command line by `Cli::into_options`.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// `owner/repo` or `owner/repo#N` specifiers, as typed
    pub repos: Vec<String>,
    pub token: String,
    /// Issue state filter for listings (open, closed, all)
    pub state: String,
    /// Parent of the `md/` directory; the working directory when None
    pub destination: Option<PathBuf>,
    /// Where comments.json goes
    pub output: PathBuf,
    /// API base URL (overridable so tests can point at a mock server)
    pub api_url: String,
    pub timeout: Option<Duration>,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Number of records written to the dataset
    pub issues: usize,
    pub dataset: PathBuf,
    pub markdown_dir: PathBuf,
}

/// Fetches and enriches every issue selected by `target`.
///
/// Parameters:
///   client: shared by every repository, so all requests share one limiter
///   target: one parsed specifier
///
/// Returns: this repository's records, owned by this call alone
pub async fn export_target(
    client: &GithubClient,
    target: &RepoTarget,
) -> Result<Vec<IssueRecord>, ExportError> {
    match target.filter.selection {
        IssueSelection::All => {
            // Walk every page first, then fetch comments for all of them
            let stubs = github::list_issues(client, target).await?;
            enrich_all(client, target, stubs).await
        }
        IssueSelection::Single(number) => {
            // One issue, one comment list, no pagination
            let stub = github::fetch_issue(client, target, number).await?;
            Ok(vec![enrich(client, target, stub).await?])
        }
    }
}

/// Runs every target concurrently and concatenates their records.
///
/// Returns: every record of every repository, grouped by repository in
/// target order, or the first error any repository hit
pub async fn collect_dataset(
    client: &GithubClient,
    targets: &[RepoTarget],
) -> Result<Vec<IssueRecord>, ExportError> {
    // Callers normally go through parse_targets, which already rejects this
    if targets.is_empty() {
        return Err(ExportError::NoRepository);
    }

    // try_join_all polls every repository pipeline at once and fails fast:
    // the first Err cancels the others
    let per_repo = try_join_all(targets.iter().map(|target| export_target(client, target))).await?;

    // Vec<Vec<IssueRecord>> -> Vec<IssueRecord>
    Ok(per_repo.into_iter().flatten().collect())
}

/// Parses the targets, fetches everything, writes the JSON dataset and then
/// the Markdown files.
///
/// Returns: a summary for main() to print, or the error that stopped the run
pub async fn run(options: &ExportOptions) -> Result<ExportSummary, ExportError> {
    // Validation happens before any network or file activity
    let targets = github::parse_targets(&options.repos, &options.state)?;
    // Compile the template up front too, so a broken template fails
    // before we spend any requests
    let renderer = MarkdownRenderer::new()?;
    let client = GithubClient::new(&options.token, &options.api_url, options.timeout)
        .map_err(ExportError::Client)?;

    run_with_client(&client, &targets, &renderer, options).await
}

// The part of run() after setup; split out so tests can hand in a client
// with a faster limiter
async fn run_with_client(
    client: &GithubClient,
    targets: &[RepoTarget],
    renderer: &MarkdownRenderer,
    options: &ExportOptions,
) -> Result<ExportSummary, ExportError> {
    info!(repos = targets.len(), "starting export");

    // Step 1: fetch everything. Nothing touches the disk until this is done.
    let records = collect_dataset(client, targets).await?;

    // Step 2: the JSON dataset
    let issues = output::write_dataset(&records, &options.output).await?;

    // Step 3: Markdown, only after the dataset is safely written
    renderer
        .write_all(&records, options.destination.as_deref())
        .await?;

    Ok(ExportSummary {
        issues,
        dataset: options.output.clone(),
        markdown_dir: output::markdown_dir(options.destination.as_deref()),
    })
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why does each repository return its own Vec?
//    - No shared buffer means no locking and no chance of one repository's
//      issues landing in another's batch
//    - Concatenating at the end is cheap
//
// 2. try_join_all vs join_all
//    - join_all waits for everything and hands back every result
//    - try_join_all stops at the first Err, which is what "first error
//      aborts the run" means
//
// 3. Why is writing strictly after fetching?
//    - A failed run leaves no half-written comments.json or md/ behind
//
// 4. Where do the concurrency limits live?
//    - Across repositories: none, every target starts at once
//    - Comments within a repository: ENRICH_CONCURRENCY in comments.rs
//    - Request starts across the whole run: the client's rate limiter
// -----------------------------------------------------------------------------
