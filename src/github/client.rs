// src/github/client.rs
// =============================================================================
// The HTTP fetcher: one authenticated GET against the GitHub REST API,
// gated by the shared rate limiter, returning a decoded JSON body.
//
// GitHub reports failures as a JSON object with a `message` field. Any body
// shaped like that is treated as an API error, whatever the status code,
// because a listing that suddenly returns an object instead of an array is
// never something the pipeline can use.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::limiter::RateLimiter;
use crate::error::FetchError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

// GitHub rejects requests without a User-Agent, so we always send one
const USER_AGENT: &str = concat!("offline-issues/", env!("CARGO_PKG_VERSION"));

/// Cheap to clone; clones share the connection pool and the rate limiter.
#[derive(Debug, Clone)]
pub struct GithubClient {
    // reqwest's client keeps a connection pool, so we build it once
    http: Client,
    // e.g. "https://api.github.com", never with a trailing slash
    base_url: String,
    // Shared by every clone, so all pipelines obey one ceiling
    limiter: Arc<RateLimiter>,
}

impl GithubClient {
    /// Builds a client that sends `Authorization: token <token>` on every request.
    ///
    /// Parameters:
    ///   token: GitHub personal access token
    ///   base_url: REST API root (GitHub Enterprise servers use their own)
    ///   timeout: per-request timeout; `None` means requests may wait forever
    ///
    /// Returns: the client, or InvalidToken if the token can't be a header
    pub fn new(token: &str, base_url: &str, timeout: Option<Duration>) -> Result<Self, FetchError> {
        // Header values may not contain newlines or other control characters
        let mut auth = HeaderValue::from_str(&format!("token {}", token))
            .map_err(|_| FetchError::InvalidToken)?;
        // Sensitive values are left out of reqwest's Debug output
        auth.set_sensitive(true);

        // Default headers are attached to every request the client sends
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(GithubClient {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: Arc::new(RateLimiter::default()),
        })
    }

    // Swaps in a different limiter; tests use a looser one so they don't
    // spend seconds waiting on the real 10/s ceiling
    #[cfg(test)]
    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Arc::new(limiter);
        self
    }

    /// Builds `{base_url}/repos/{owner}/{repo}{rest}`.
    ///
    /// Example:
    ///   repo_url("rust-lang", "rust", "/issues/1")
    ///   -> "https://api.github.com/repos/rust-lang/rust/issues/1"
    pub fn repo_url(&self, owner: &str, repo: &str, rest: &str) -> String {
        format!("{}/repos/{}/{}{}", self.base_url, owner, repo, rest)
    }

    /// GETs `url` once the rate limiter allows it and decodes the body as `T`.
    ///
    /// Parameters:
    ///   url: absolute URL (built with repo_url, or taken from a payload)
    ///
    /// Returns: the decoded body, or a FetchError saying what went wrong
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!(url, "GET");

        // Only the *start* of the request is rate limited; reqwest errors
        // (DNS, TLS, connection reset, timeout) become FetchError::Transport
        let response = self.limiter.schedule(self.http.get(url).send()).await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        // Step 1: is it JSON at all?
        // A non-JSON body on a failed status (e.g. an HTML 502 page from a
        // proxy) is reported by its status. On a success status it is a
        // decode error.
        let body: Value = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(_) if !status.is_success() => return Err(FetchError::Status(status)),
            Err(e) => return Err(FetchError::Decode(e)),
        };

        // Step 2: is it GitHub's error shape, `{"message": ...}`?
        // Checked before the status on purpose: it carries the useful text
        if let Some(message) = api_message(&body) {
            return Err(FetchError::Api { status, message });
        }

        // Step 3: JSON, no message, but still a failure status
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        // Step 4: decode into the caller's type (Vec<IssueStub>, IssueStub...)
        Ok(serde_json::from_value(body)?)
    }
}

// Pulls the `message` out of a GitHub error payload
//
// Only JSON *objects* count. Arrays (issue listings) and other values
// return None. A non-string message is kept in its JSON form.
fn api_message(body: &Value) -> Option<String> {
    let message = body.as_object()?.get("message")?;
    Some(match message.as_str() {
        Some(text) => text.to_string(),
        None => message.to_string(),
    })
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why parse into serde_json::Value first?
//    - The same endpoint can return an array (success) or an object with a
//      `message` (failure)
//    - Looking at the Value lets us tell those apart before committing to T
//    - serde_json::from_value then turns the Value into T without reparsing
//
// 2. What is DeserializeOwned?
//    - A serde bound meaning "can be deserialized without borrowing from the
//      input"
//    - Needed because `bytes` is dropped when get_json returns
//
// 3. Why Arc<RateLimiter>?
//    - GithubClient derives Clone
//    - Arc makes every clone point at the same limiter, instead of each clone
//      getting its own 10/s budget
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GithubClient {
        GithubClient::new("secret", &server.uri(), None)
            .unwrap()
            .with_limiter(RateLimiter::per_second(1000))
    }

    #[tokio::test]
    async fn test_sends_token_and_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/issues/1"))
            .and(header("authorization", "token secret"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let url = client.repo_url("o", "r", "/issues/1");
        let body: Value = client.get_json(&url).await.unwrap();
        assert_eq!(body["id"], 1);
    }

    #[tokio::test]
    async fn test_message_payload_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        let err = client
            .get_json::<Vec<Value>>(&client.repo_url("o", "r", "/issues"))
            .await
            .unwrap_err();
        match err {
            FetchError::Api { status, message } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "Not Found");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_message_payload_with_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "API rate limit exceeded"})),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        let err = client
            .get_json::<Vec<Value>>(&client.repo_url("o", "r", "/issues"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Api { .. }));
    }

    #[tokio::test]
    async fn test_non_json_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = client(&server);
        let err = client
            .get_json::<Value>(&client.repo_url("o", "r", "/issues"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(StatusCode::BAD_GATEWAY)));
    }

    #[test]
    fn test_repo_url_trims_trailing_slash() {
        let client = GithubClient::new("t", "https://ghe.example.com/api/v3/", None).unwrap();
        assert_eq!(
            client.repo_url("o", "r", "/issues/3"),
            "https://ghe.example.com/api/v3/repos/o/r/issues/3"
        );
    }

    #[test]
    fn test_rejects_token_with_newline() {
        let result = GithubClient::new("bad\ntoken", DEFAULT_API_URL, None);
        assert!(matches!(result, Err(FetchError::InvalidToken)));
    }
}
