// src/output/markdown.rs
// =============================================================================
// Renders one Markdown file per issue from templates/issue.hbs.
//
// The handlebars registry is built once per run. Issue titles, issue bodies
// and comment bodies are already Markdown, so the template emits them with
// triple braces (no escaping). Every other field goes through the default
// escaper.
//
// File names come from the issue's HTML URL:
//   https://github.com/<owner>/<repo>/<kind>/<number> -> <owner>-<repo>-<number>.md
// =============================================================================

use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use tracing::{debug, info};
use url::Url;

use crate::error::ExportError;
use crate::export::IssueRecord;

// Name the template is registered under
const TEMPLATE_NAME: &str = "issue";
// Baked into the binary at compile time, so there is no file to lose
const TEMPLATE: &str = include_str!("../../templates/issue.hbs");

/// Owner, repository and number pulled out of an issue's HTML URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueLocation {
    pub owner: String,
    pub repo: String,
    pub number: String,
}

impl IssueLocation {
    /// Accepts exactly `/<owner>/<repo>/<kind>/<number>` paths, where kind is
    /// `issues` or `pull`.
    ///
    /// Returns: the three pieces, or UnexpectedIssueUrl for any other shape
    pub fn parse(html_url: &str) -> Result<Self, ExportError> {
        let unexpected = || ExportError::UnexpectedIssueUrl(html_url.to_string());

        // Let the url crate deal with scheme, host, query and fragment
        let url = Url::parse(html_url).map_err(|_| unexpected())?;
        // path_segments() is None only for URLs like "mailto:x" that have
        // no path to split
        let segments: Vec<&str> = url.path_segments().ok_or_else(unexpected)?.collect();

        // Slice patterns check the length and the kind in one go
        match segments.as_slice() {
            [owner, repo, "issues" | "pull", number]
                if !owner.is_empty() && !repo.is_empty() && !number.is_empty() =>
            {
                Ok(IssueLocation {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    number: number.to_string(),
                })
            }
            _ => Err(unexpected()),
        }
    }

    // owner-repo-number.md
    pub fn file_name(&self) -> String {
        format!("{}-{}-{}.md", self.owner, self.repo, self.number)
    }
}

/// `<destination>/md`, or `md` in the working directory.
pub fn markdown_dir(destination: Option<&Path>) -> PathBuf {
    match destination {
        Some(destination) => destination.join("md"),
        None => PathBuf::from("md"),
    }
}

/// Turns IssueRecords into Markdown files.
pub struct MarkdownRenderer {
    // 'static: the only template is a &'static str baked into the binary
    registry: Handlebars<'static>,
}

impl MarkdownRenderer {
    // Compiles the template once; every render() reuses it
    pub fn new() -> Result<Self, ExportError> {
        let mut registry = Handlebars::new();
        registry
            .register_template_string(TEMPLATE_NAME, TEMPLATE)
            .map_err(|e| ExportError::Template(Box::new(e)))?;
        Ok(MarkdownRenderer { registry })
    }

    // Renders one record. IssueRecord is Serialize, so handlebars sees the
    // same field names as comments.json.
    pub fn render(&self, record: &IssueRecord) -> Result<String, ExportError> {
        self.registry
            .render(TEMPLATE_NAME, record)
            .map_err(|source| ExportError::Render {
                url: record.url.clone(),
                source,
            })
    }

    /// Writes one file per record into `markdown_dir(destination)`, creating
    /// the directory first. Returns the number of files written.
    pub async fn write_all(
        &self,
        records: &[IssueRecord],
        destination: Option<&Path>,
    ) -> Result<usize, ExportError> {
        let dir = markdown_dir(destination);
        // Step 1: make sure md/ exists (no error if it already does)
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| ExportError::Write {
                path: dir.clone(),
                source,
            })?;

        // Step 2: one file per record, overwriting older exports.
        // The first bad URL or failed write stops the loop.
        for record in records {
            let path = dir.join(IssueLocation::parse(&record.url)?.file_name());
            let text = self.render(record)?;
            tokio::fs::write(&path, text)
                .await
                .map_err(|source| ExportError::Write {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %path.display(), "wrote markdown");
        }

        info!(files = records.len(), dir = %dir.display(), "wrote markdown files");
        Ok(records.len())
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Double vs triple braces in handlebars
//    - {{x}} HTML-escapes the value (& becomes &amp;)
//    - {{{x}}} writes it raw
//    - Titles and bodies are Markdown already; escaping would mangle them
//
// 2. Why refuse unknown URL shapes instead of guessing a file name?
//    - A guessed name could collide with another issue's file and silently
//      overwrite it
//
// 3. Why are files written one at a time?
//    - They are small and local; the slow part of a run is the network
//    - Sequential writes keep the "first error stops" rule simple
// -----------------------------------------------------------------------------
