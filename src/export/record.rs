// src/export/record.rs
// =============================================================================
// The normalized shapes written to the dataset.
//
// An IssueRecord can only be built together with its comments, so there is
// no way to hold (or write out) an issue whose comments were never fetched.
// Comments are kept as raw JSON objects; only `created_at` is rewritten to a
// localized date.
// =============================================================================

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::github::{IssueSelection, IssueStub, RepoTarget};

/// One comment as GitHub returned it, with `created_at` localized.
///
/// `#[serde(transparent)]` makes it serialize as the inner object, so every
/// field GitHub sent ends up in the dataset untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentRecord(Map<String, Value>);

impl CommentRecord {
    // Wraps a raw comment object
    //
    // Parameters:
    //   fields: the comment exactly as the API returned it
    //
    // Returns: the same object with `created_at` turned into M/D/YYYY
    pub fn new(mut fields: Map<String, Value>) -> Self {
        // Only a string created_at is rewritten. A missing key, null, or a
        // non-string value is left exactly as it came in.
        if let Some(Value::String(created_at)) = fields.get_mut("created_at") {
            // Overwrite in place through the &mut String; the map keeps its
            // key order
            *created_at = localized_date(created_at);
        }
        CommentRecord(fields)
    }

    #[cfg(test)]
    pub fn body(&self) -> Option<&str> {
        self.0.get("body").and_then(Value::as_str)
    }

    #[cfg(test)]
    pub fn created_at(&self) -> Option<&str> {
        self.0.get("created_at").and_then(Value::as_str)
    }
}

/// A fully enriched issue.
///
/// Field order here is the key order in comments.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRecord {
    pub id: u64,
    /// Browser URL of the issue
    pub url: String,
    pub title: String,
    /// Login of the author ("" if GitHub sent no user)
    pub created_by: String,
    /// Local M/D/YYYY date
    pub created_at: String,
    pub body: Option<String>,
    pub state: String,
    pub comments: Vec<CommentRecord>,
    pub comments_url: String,
    /// Milestone title, null when there is none
    pub milestone: Option<String>,
    /// Short `owner/repo#N` label used in the Markdown output
    pub quicklink: String,
}

impl IssueRecord {
    /// Joins a stub with its fetched comments.
    ///
    /// Parameters:
    ///   stub: consumed; its fields move into the record
    ///   target: decides the quicklink shape
    ///   comments: already localized
    pub fn assemble(stub: IssueStub, target: &RepoTarget, comments: Vec<CommentRecord>) -> Self {
        // All-mode: repository name plus the issue number from the URL.
        // Single-mode: the specifier already ends in #N, use it as-is.
        let quicklink = match target.filter.selection {
            IssueSelection::All => format!("{}#{}", target.full_name, trailing_segment(&stub.html_url)),
            IssueSelection::Single(_) => target.full_name.clone(),
        };

        IssueRecord {
            id: stub.id,
            title: stub.title,
            created_by: stub.user.map(|user| user.login).unwrap_or_default(),
            created_at: localized_date(&stub.created_at),
            body: stub.body,
            state: stub.state,
            comments,
            comments_url: stub.comments_url,
            milestone: stub.milestone.map(|milestone| milestone.title),
            quicklink,
            url: stub.html_url,
        }
    }
}

/// Last `/`-separated piece of a URL; the issue number for issue URLs.
pub fn trailing_segment(url: &str) -> &str {
    // rsplit() walks from the right, so next() is the last piece.
    // A trailing slash is trimmed first so ".../7/" still gives "7".
    url.trim_end_matches('/').rsplit('/').next().unwrap_or(url)
}

/// Formats an ISO-8601 timestamp as a local `M/D/YYYY` date.
///
/// Anything that does not parse as RFC 3339 is returned unchanged.
pub fn localized_date(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        // Convert to the machine's time zone before taking the date, so an
        // issue opened late at night UTC may land on the previous day
        Ok(timestamp) => format_date(&timestamp.with_timezone(&Local)),
        Err(_) => raw.to_string(),
    }
}

// Generic over the time zone so tests can pin Utc while the real code uses
// Local. %-m and %-d drop the leading zeros (3/4/2021, not 03/04/2021).
fn format_date<Tz>(timestamp: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    timestamp.format("%-m/%-d/%Y").to_string()
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why is CommentRecord a newtype over Map instead of a struct?
//    - We don't know (or care) which fields GitHub sends for a comment
//    - A struct would silently drop every field we forgot to list
//    - The newtype keeps them all and still gives the type a name
//
// 2. Why does IssueRecord have no constructor other than assemble()?
//    - assemble() demands the comments up front
//    - So an issue can't reach the writer with its comments missing
//
// 3. unwrap_or_default() on the user
//    - A deleted account comes back as user: null
//    - We write "" rather than failing the whole export
//
// 4. Why does localized_date() return the input on a parse failure?
//    - The date is cosmetic; a weird timestamp is no reason to abort
// -----------------------------------------------------------------------------
