// src/error.rs
// =============================================================================
// Error types for the export pipeline.
//
// Two layers:
// - FetchError: what can go wrong with a single GET against the API
// - ExportError: what aborts a run, tagged with the phase it happened in
//
// Nothing is recovered locally. Every error bubbles up to main(), which
// prints it and exits with a non-zero code.
// =============================================================================

use std::fmt;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of one authenticated GET.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a readable response (DNS, TLS, reset, timeout...)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with an error payload (`{"message": ...}`)
    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// Non-success status without an error payload
    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),

    /// The body was not the JSON shape we expected
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("token contains characters that are not allowed in an HTTP header")]
    InvalidToken,
}

/// Which request an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Paging through `/issues?state=..&page=..`
    Listing,
    /// Fetching one named issue
    Issue,
    /// Fetching an issue's comments
    Comments,
    /// Writing comments.json or a Markdown file to disk
    Write,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Listing => "issue listing",
            Phase::Issue => "issue",
            Phase::Comments => "comments",
            Phase::Write => "write",
        };
        f.write_str(name)
    }
}

/// Anything that aborts an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No repository given.")]
    NoRepository,

    #[error("invalid repository '{0}': expected owner/repo or owner/repo#number")]
    InvalidSpecifier(String),

    #[error("could not set up HTTP client: {0}")]
    Client(#[source] FetchError),

    #[error("error in request for {phase} {url}: {source}")]
    Request {
        phase: Phase,
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("unexpected issue URL shape '{0}': expected https://host/owner/repo/<kind>/<number>")]
    UnexpectedIssueUrl(String),

    #[error("error serializing dataset: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("error writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error rendering markdown for {url}: {source}")]
    Render {
        url: String,
        #[source]
        source: handlebars::RenderError,
    },

    #[error("invalid markdown template: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),
}

impl ExportError {
    /// Which phase of the run failed.
    ///
    /// Returns: the request phase for request errors, Write for filesystem
    /// errors, None for everything caught before any I/O (validation,
    /// templates) or while serializing
    pub fn phase(&self) -> Option<Phase> {
        match self {
            ExportError::Request { phase, .. } => Some(*phase),
            ExportError::Write { .. } => Some(Phase::Write),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why thiserror here and anyhow in main.rs?
//    - Inside the crate we want errors we can match on (tests check the
//      variant and the phase)
//    - At the binary boundary we only print them, which is what anyhow is for
//
// 2. #[from] vs #[source]
//    - #[from] also generates a From impl, so `?` converts automatically
//    - #[source] only links the cause; we use it where the variant needs
//      extra fields (a URL, a path) that `?` couldn't fill in
//
// 3. Why is TemplateError boxed?
//    - It is large; boxing keeps every Result<_, ExportError> small
// -----------------------------------------------------------------------------
