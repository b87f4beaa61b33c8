// src/export/comments.rs
// =============================================================================
// The comment aggregator: turns issue stubs into IssueRecords by fetching
// each issue's comments.
//
// Fan-out is bounded: at most ENRICH_CONCURRENCY comment requests are in
// flight for one repository (and every request still passes the shared rate
// limiter). Records come back in completion order, not issue order.
//
// The first failed comment fetch aborts the whole batch.
// =============================================================================

// StreamExt gives us buffer_unordered(), TryStreamExt gives try_collect()
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::{Map, Value};
use tracing::debug;

use super::record::{trailing_segment, CommentRecord, IssueRecord};
use crate::error::{ExportError, Phase};
use crate::github::{GithubClient, IssueSelection, IssueStub, RepoTarget};

/// Maximum comment fetches in flight per repository
pub const ENRICH_CONCURRENCY: usize = 10;

/// Where to find the comments for `stub`.
///
/// Parameters:
///   client: used only to build API URLs against the configured base
///   target: decides between the stub's URL and a constructed one
///   stub: the issue whose comments we want
///
/// Returns: the absolute URL of the comment list
///
/// All-mode uses the stub's own `comments_url`; single-mode builds
/// `/repos/{owner}/{repo}/issues/{number}/comments`.
pub fn comments_url(client: &GithubClient, target: &RepoTarget, stub: &IssueStub) -> String {
    let number = match target.filter.selection {
        // The listing told us where the comments live; trust it
        IssueSelection::All if !stub.comments_url.is_empty() => return stub.comments_url.clone(),
        // Sparse payload without comments_url: the issue number is the last
        // piece of html_url
        IssueSelection::All => trailing_segment(&stub.html_url).to_string(),
        // Single-mode always builds the URL from the number the user typed
        IssueSelection::Single(number) => number.to_string(),
    };
    client.repo_url(
        &target.owner,
        &target.name,
        &format!("/issues/{}/comments", number),
    )
}

/// Fetches the comments of one issue and assembles its record.
///
/// Returns: the finished IssueRecord, or a Comments-phase error
pub async fn enrich(
    client: &GithubClient,
    target: &RepoTarget,
    stub: IssueStub,
) -> Result<IssueRecord, ExportError> {
    let url = comments_url(client, target, &stub);
    debug!(repo = %target.full_name, %url, "fetching comments");

    // Comments stay as raw JSON objects; we never need a typed view of them
    let raw: Vec<Map<String, Value>> =
        client
            .get_json(&url)
            .await
            .map_err(|source| ExportError::Request {
                phase: Phase::Comments,
                url,
                source,
            })?;

    // Localize each comment's created_at, then join them with the stub
    let comments = raw.into_iter().map(CommentRecord::new).collect();
    Ok(IssueRecord::assemble(stub, target, comments))
}

/// Enriches every stub, at most ENRICH_CONCURRENCY at a time.
///
/// Parameters:
///   stubs: consumed; each one turns into exactly one record
///
/// Returns: one record per stub in completion order, or the first error
pub async fn enrich_all(
    client: &GithubClient,
    target: &RepoTarget,
    stubs: Vec<IssueStub>,
) -> Result<Vec<IssueRecord>, ExportError> {
    // Step 1: a lazy stream of futures, one per stub (nothing runs yet)
    stream::iter(stubs.into_iter().map(|stub| enrich(client, target, stub)))
        // Step 2: poll up to ENRICH_CONCURRENCY of them at once; when one
        // finishes, the next stub's future is started in its place
        .buffer_unordered(ENRICH_CONCURRENCY)
        // Step 3: gather the records. The first Err stops the stream and
        // the futures still in the buffer are dropped (cancelled)
        .try_collect()
        .await
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. buffer_unordered vs buffered
//    - buffered(N) yields results in input order, so one slow issue holds
//      back everything queued behind it
//    - buffer_unordered(N) yields whatever finishes first
//    - Record order in the dataset is not meaningful, so we take the faster
//      one
//
// 2. Two separate limits apply to every comment request
//    - ENRICH_CONCURRENCY: how many requests of one repository are in flight
//    - The client's RateLimiter: how many requests of the whole run may
//      start per second
//
// 3. Why does enrich() take the stub by value?
//    - Its fields move into the IssueRecord; no clone needed
//
// 4. What happens to in-flight requests after an error?
//    - try_collect returns early, the stream is dropped, and dropping a
//      future cancels it. No partial result escapes.
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{RateLimiter, User};
    use serde_json::json;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GithubClient {
        GithubClient::new("t", &server.uri(), None)
            .unwrap()
            .with_limiter(RateLimiter::per_second(1000))
    }

    fn stub(server: &MockServer, number: u64) -> IssueStub {
        IssueStub {
            id: number,
            html_url: format!("https://github.com/o/r/issues/{}", number),
            title: format!("Issue {}", number),
            user: Some(User {
                login: "octocat".to_string(),
            }),
            created_at: "2021-03-04T12:00:00Z".to_string(),
            body: None,
            state: "open".to_string(),
            milestone: None,
            comments_url: format!("{}/repos/o/r/issues/{}/comments", server.uri(), number),
        }
    }

    async fn mount_comments(server: &MockServer, number: u64, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/o/r/issues/{}/comments", number)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_enrich_all_attaches_comments() {
        let server = MockServer::start().await;
        for number in 1..=25 {
            mount_comments(
                &server,
                number,
                json!([{"id": number, "body": format!("comment on {}", number), "created_at": "2021-05-06T12:00:00Z"}]),
            )
            .await;
        }

        let target = RepoTarget::parse("o/r", "open").unwrap();
        let stubs = (1..=25).map(|n| stub(&server, n)).collect();
        let mut records = enrich_all(&client(&server), &target, stubs).await.unwrap();
        records.sort_by_key(|record| record.id);

        assert_eq!(records.len(), 25);
        for record in &records {
            assert_eq!(record.comments.len(), 1);
            assert_eq!(
                record.comments[0].body(),
                Some(format!("comment on {}", record.id).as_str())
            );
            assert_ne!(record.comments[0].created_at(), Some("2021-05-06T12:00:00Z"));
            assert_eq!(record.quicklink, format!("o/r#{}", record.id));
        }
    }

    #[tokio::test]
    async fn test_single_mode_builds_comments_url() {
        let server = MockServer::start().await;
        mount_comments(&server, 42, json!([])).await;

        let target = RepoTarget::parse("o/r#42", "open").unwrap();
        let mut issue = stub(&server, 42);
        issue.comments_url = "https://elsewhere.invalid/comments".to_string();

        let record = enrich(&client(&server), &target, issue).await.unwrap();
        assert!(record.comments.is_empty());
        assert_eq!(record.quicklink, "o/r#42");
    }

    #[tokio::test]
    async fn test_comment_failure_aborts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/issues/1/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/issues/2/comments"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "Server Error"})))
            .mount(&server)
            .await;

        let target = RepoTarget::parse("o/r", "open").unwrap();
        let stubs = vec![stub(&server, 1), stub(&server, 2)];
        let err = enrich_all(&client(&server), &target, stubs).await.unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Comments));
    }

    #[tokio::test]
    async fn test_in_flight_comment_fetches_are_capped() {
        // Every comment request takes 200ms. With 30 issues and a cap of 10
        // they run in three waves, so the batch can't finish before 600ms.
        // Uncapped it would take ~200ms; one at a time ~6s.
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(30)
            .mount(&server)
            .await;

        let target = RepoTarget::parse("o/r", "open").unwrap();
        let stubs = (1..=30).map(|n| stub(&server, n)).collect();

        let started = Instant::now();
        let records = enrich_all(&client(&server), &target, stubs).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(records.len(), 30);
        assert_eq!(ENRICH_CONCURRENCY, 10);
        assert!(elapsed >= Duration::from_millis(600), "finished in {:?}, cap not applied", elapsed);
        assert!(elapsed < Duration::from_secs(3), "finished in {:?}, requests ran serially", elapsed);
    }

    #[test]
    fn test_comments_url_fallback_without_stub_url() {
        let client = GithubClient::new("t", "https://api.github.com", None).unwrap();
        let target = RepoTarget::parse("o/r", "open").unwrap();
        let issue = IssueStub {
            html_url: "https://github.com/o/r/issues/5".to_string(),
            ..IssueStub::default()
        };
        assert_eq!(
            comments_url(&client, &target, &issue),
            "https://api.github.com/repos/o/r/issues/5/comments"
        );
    }
}
