// src/cli.rs
// =============================================================================
// Command-line interface, defined with clap's derive API.
//
// Usage:
//   offline-issues --token <TOKEN> owner/repo [owner/other#12 ...]
//
// The token can also come from the GITHUB_TOKEN environment variable.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::export::ExportOptions;
use crate::github::DEFAULT_API_URL;

#[derive(Parser, Debug)]
#[command(
    name = "offline-issues",
    version,
    about = "Export GitHub issues and their comments to JSON and Markdown",
    long_about = "offline-issues downloads every issue of a repository (or a single issue) \
                  together with its comments, writes them to comments.json and renders one \
                  Markdown file per issue so they can be read offline."
)]
pub struct Cli {
    /// Repositories to export: owner/repo, or owner/repo#number for one issue
    ///
    /// Not required by the parser; an empty list is reported as
    /// "No repository given." before anything is fetched.
    pub repos: Vec<String>,

    /// GitHub token, sent as `Authorization: token <TOKEN>`
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Issue state to list (open, closed or all)
    #[arg(long, default_value = "open")]
    pub state: String,

    /// Base directory for Markdown output; files go to <DESTINATION>/md/
    #[arg(long)]
    pub destination: Option<PathBuf>,

    /// Where to write the JSON dataset
    #[arg(long, default_value = "comments.json")]
    pub output: PathBuf,

    /// GitHub REST API base URL
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Per-request timeout in seconds (no timeout if omitted)
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl Cli {
    pub fn into_options(self) -> ExportOptions {
        ExportOptions {
            repos: self.repos,
            token: self.token,
            state: self.state,
            destination: self.destination,
            output: self.output,
            api_url: self.api_url,
            timeout: self.timeout.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["offline-issues", "--token", "abc", "o/r"]).unwrap();
        let options = cli.into_options();
        assert_eq!(options.repos, vec!["o/r"]);
        assert_eq!(options.token, "abc");
        assert_eq!(options.state, "open");
        assert_eq!(options.destination, None);
        assert_eq!(options.output, PathBuf::from("comments.json"));
        assert_eq!(options.api_url, DEFAULT_API_URL);
        assert_eq!(options.timeout, None);
    }

    #[test]
    fn test_all_options() {
        let cli = Cli::try_parse_from([
            "offline-issues",
            "--token",
            "abc",
            "--state",
            "closed",
            "--destination",
            "out",
            "--timeout",
            "30",
            "o/r",
            "o/s#4",
        ])
        .unwrap();
        let options = cli.into_options();
        assert_eq!(options.repos, vec!["o/r", "o/s#4"]);
        assert_eq!(options.state, "closed");
        assert_eq!(options.destination, Some(PathBuf::from("out")));
        assert_eq!(options.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_no_repos_is_accepted_by_parser() {
        let cli = Cli::try_parse_from(["offline-issues", "--token", "abc"]).unwrap();
        assert!(cli.repos.is_empty());
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why is `repos` not `required`?
//    - clap would reject an empty list with its own usage error
//    - We want the export pipeline to own that check so the same message
//      comes back whether it is driven from the CLI or from code
//
// 2. What does `env = "GITHUB_TOKEN"` do?
//    - If --token is missing, clap reads the environment variable instead
//    - hide_env_values keeps the token out of --help output
// -----------------------------------------------------------------------------
