// src/github/target.rs
// =============================================================================
// Turns user-supplied repository specifiers into RepoTargets.
//
// Supported forms:
//   - owner/repo       -> fetch every issue (paginated)
//   - owner/repo#42    -> fetch only issue 42
//
// A RepoTarget is built once and never changed afterwards; the pipeline
// only ever borrows it.
// =============================================================================

use std::fmt;

use crate::error::ExportError;

/// Which issues to fetch for a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSelection {
    /// Every issue, walked page by page
    All,
    /// Exactly one issue, by number
    Single(u64),
}

impl fmt::Display for IssueSelection {
    // "all" or the issue number, matching the filter id used in listings
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueSelection::All => f.write_str("all"),
            IssueSelection::Single(number) => write!(f, "{}", number),
        }
    }
}

// What to ask GitHub for: which issues, and in which state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFilter {
    pub selection: IssueSelection,
    /// Forwarded verbatim into the listing query string
    pub state: String,
}

/// One repository to export, derived from an `owner/repo[#number]` specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoTarget {
    pub owner: String,
    pub name: String,
    /// The specifier exactly as the user typed it
    pub full_name: String,
    pub filter: IssueFilter,
}

impl RepoTarget {
    /// Parses a specifier like `rust-lang/rust` or `rust-lang/rust#1234`.
    ///
    /// Parameters:
    ///   specifier: the command-line argument, untouched
    ///   state: issue state filter for listings
    ///
    /// Returns: the target, or InvalidSpecifier naming the bad input
    pub fn parse(specifier: &str, state: &str) -> Result<Self, ExportError> {
        // Every failure below reports the whole specifier
        let invalid = || ExportError::InvalidSpecifier(specifier.to_string());

        // "owner/rest": the first '/' separates the owner
        let (owner, rest) = specifier.split_once('/').ok_or_else(invalid)?;

        // Split off the issue number, if there is one
        let (name, selection) = match rest.split_once('#') {
            Some((name, number)) => {
                // Must be a positive integer; "#", "#abc" and "#0" are all rejected
                let number: u64 = number.parse().map_err(|_| invalid())?;
                if number == 0 {
                    return Err(invalid());
                }
                (name, IssueSelection::Single(number))
            }
            None => (rest, IssueSelection::All),
        };

        // "a/b/c" leaves a '/' in the name, which no repository has
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(RepoTarget {
            owner: owner.to_string(),
            name: name.to_string(),
            full_name: specifier.to_string(),
            filter: IssueFilter {
                selection,
                state: state.to_string(),
            },
        })
    }
}

/// Parses every specifier, failing on an empty list before any I/O happens.
pub fn parse_targets(specifiers: &[String], state: &str) -> Result<Vec<RepoTarget>, ExportError> {
    if specifiers.is_empty() {
        return Err(ExportError::NoRepository);
    }
    specifiers
        .iter()
        .map(|spec| RepoTarget::parse(spec, state))
        .collect()
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why keep full_name exactly as typed?
//    - It is the label users recognize in logs and in the quicklink
//
// 2. collect() into Result<Vec<_>, _>
//    - Collecting an iterator of Results stops at the first Err and returns
//      it, otherwise gives back the Vec
// -----------------------------------------------------------------------------
