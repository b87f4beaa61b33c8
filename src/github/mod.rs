// src/github/mod.rs
// =============================================================================
// Everything that talks to the GitHub REST API.
//
// - target: parsing `owner/repo[#number]` specifiers
// - limiter: the fixed-rate request cap shared by every request
// - client: one authenticated, rate-limited GET
// - issues: paging through issue listings and fetching single issues
// =============================================================================

mod client;
mod issues;
mod limiter;
mod target;

pub use client::{GithubClient, DEFAULT_API_URL};
pub use issues::{fetch_issue, list_issues, IssueStub};
pub use target::{parse_targets, IssueSelection, RepoTarget};

// Only tests build stubs by hand or swap in a faster limiter
#[cfg(test)]
pub use issues::{Milestone, User};
#[cfg(test)]
pub use limiter::RateLimiter;
