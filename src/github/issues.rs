// src/github/issues.rs
// =============================================================================
// Getting issue stubs out of GitHub.
//
// Two ways in:
// - list_issues: walk `/issues?state=..&page=N&per_page=1000` from page 1
//   until a page comes back empty. Pages are requested strictly one after
//   another.
// - fetch_issue: a single GET for `/issues/{number}`.
//
// The page counter and the stub buffer live in a PageCursor owned by one
// call to list_issues, so two repositories paginating at the same time can
// never see each other's progress.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::client::GithubClient;
use super::target::RepoTarget;
use crate::error::{ExportError, Phase};

/// Page size asked for in listing requests
pub const PER_PAGE: u32 = 1000;

// The author of an issue (GitHub sends much more; we only keep the login)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub login: String,
}

// The milestone an issue belongs to, if any
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Milestone {
    #[serde(default)]
    pub title: String,
}

/// The listing endpoint's view of an issue, before comments are attached.
///
/// Fields we don't list here are ignored by serde. Everything except `id`,
/// `html_url` and `created_at` has a default, so a sparse payload (a deleted
/// user, no body) still decodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueStub {
    pub id: u64,
    /// Browser URL, e.g. https://github.com/owner/repo/issues/42
    pub html_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub user: Option<User>,
    /// ISO-8601 timestamp as GitHub sends it
    pub created_at: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub milestone: Option<Milestone>,
    /// API URL of the comment list (empty if the payload had none)
    #[serde(default)]
    pub comments_url: String,
}

// Pagination progress for one repository
//
// Created fresh by every list_issues() call and dropped when it returns,
// so concurrent repositories can't share a page number or a buffer.
#[derive(Debug)]
struct PageCursor {
    // Next page to request (GitHub pages start at 1)
    page: u32,
    // Everything collected so far, in page order
    stubs: Vec<IssueStub>,
}

impl PageCursor {
    fn new() -> Self {
        PageCursor {
            page: 1,
            stubs: Vec::new(),
        }
    }

    // Takes in a non-empty page and moves on to the next one
    fn advance(&mut self, page: Vec<IssueStub>) {
        self.stubs.extend(page);
        self.page += 1;
    }
}

// Builds the listing URL for one page
//
// Example:
//   .../repos/o/r/issues?state=open&page=2&per_page=1000
//
// `state` is passed through as typed by the user (open, closed, all).
fn listing_url(client: &GithubClient, target: &RepoTarget, page: u32) -> String {
    client.repo_url(
        &target.owner,
        &target.name,
        &format!(
            "/issues?state={}&page={}&per_page={}",
            target.filter.state, page, PER_PAGE
        ),
    )
}

/// Collects every issue stub of `target`, page by page.
///
/// Parameters:
///   client: shared, rate-limited GitHub client
///   target: an all-mode repository target
///
/// Returns: all stubs in page order, or the first error
///
/// Stops at the first empty page. Any failed page aborts the whole listing;
/// nothing collected so far is returned.
pub async fn list_issues(
    client: &GithubClient,
    target: &RepoTarget,
) -> Result<Vec<IssueStub>, ExportError> {
    let mut cursor = PageCursor::new();

    loop {
        let url = listing_url(client, target, cursor.page);
        debug!(repo = %target.full_name, page = cursor.page, "fetching issue page");

        // Pages are strictly sequential: we await this one before asking
        // for the next. An error payload (`{"message": ...}`) is caught by
        // get_json and comes back here as a Listing-phase error.
        let page: Vec<IssueStub> = client.get_json(&url).await.map_err(|source| {
            ExportError::Request {
                phase: Phase::Listing,
                url,
                source,
            }
        })?;

        // An empty page means we've walked past the last issue
        if page.is_empty() {
            break;
        }
        cursor.advance(page);
    }

    info!(
        repo = %target.full_name,
        pages = cursor.page - 1,
        issues = cursor.stubs.len(),
        "listed issues"
    );
    Ok(cursor.stubs)
}

/// Fetches one issue by number (single-mode, no pagination).
///
/// Parameters:
///   number: the issue number from an `owner/repo#number` specifier
pub async fn fetch_issue(
    client: &GithubClient,
    target: &RepoTarget,
    number: u64,
) -> Result<IssueStub, ExportError> {
    let url = client.repo_url(&target.owner, &target.name, &format!("/issues/{}", number));
    debug!(repo = %target.full_name, number, "fetching issue");

    client
        .get_json(&url)
        .await
        .map_err(|source| ExportError::Request {
            phase: Phase::Issue,
            url,
            source,
        })
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a PageCursor struct instead of two local variables?
//    - It names the state a pagination run owns: where we are and what we
//      have so far
//    - It makes the "one cursor per repository" rule visible in the types
//
// 2. Why is the loop sequential instead of fetching pages in parallel?
//    - We only learn that we are done when a page comes back empty
//    - Requesting ahead would waste requests past the end
//
// 3. What does #[serde(default)] do?
//    - If the field is missing from the JSON, serde fills in Default::default()
//    - For Option<T> that is None, for String it is ""
//
// 4. Why is the page counter u32?
//    - Pages are small positive numbers; u32 gives plenty of room
// -----------------------------------------------------------------------------
