//! Upstream YouTube Data API client and error classification.
//!
//! All knowledge of the upstream wire shape lives here: the search
//! endpoint, the fixed policy parameters, and the mapping from the
//! structured error envelope into [`UpstreamError`]. The failover loop
//! in [`crate::proxy`] only ever branches on the classified error, never
//! on raw response fields.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// YouTube Data API v3 search endpoint.
const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/search";

/// A normalized search request.
///
/// The result limit is clamped into `[1, max]` at construction, so every
/// downstream consumer sees a bounded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub page_token: Option<String>,
    pub limit: u32,
}

impl SearchQuery {
    /// Build a query, clamping `limit` into `[1, max_results]`.
    ///
    /// An empty query string is valid and passed through to upstream
    /// as-is; rejecting it is the caller's business, not ours.
    pub fn new(
        query: impl Into<String>,
        page_token: Option<String>,
        limit: u32,
        max_results: u32,
    ) -> Self {
        Self {
            query: query.into(),
            page_token,
            limit: limit.clamp(1, max_results.max(1)),
        }
    }
}

/// Classified upstream failure.
///
/// The variant decides the failover loop's next move: quota and
/// credential problems are worth retrying on another key, a rejection
/// will fail identically everywhere and is terminal.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("quota exceeded ({reason})")]
    QuotaExceeded { reason: String },

    #[error("invalid API key ({reason})")]
    InvalidCredential { reason: String },

    #[error("upstream rejected request (HTTP {status})")]
    Rejected { status: u16, body: String },

    #[error("transport failure: {0}")]
    Transport(String),
}

/// The upstream search collaborator.
///
/// A trait seam so tests can substitute a scripted stub and count
/// attempts.
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Perform one search attempt with the given API key.
    ///
    /// Returns the raw successful response body.
    async fn search(&self, api_key: &str, query: &SearchQuery) -> Result<String, UpstreamError>;
}

/// Real client for the YouTube Data API v3 search endpoint.
pub struct YoutubeSearch {
    client: Client,
    endpoint: Url,
}

impl YoutubeSearch {
    /// Create a client with a per-attempt timeout so one hung key cannot
    /// stall the whole failover loop.
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            endpoint: Url::parse(SEARCH_ENDPOINT).expect("Invalid search endpoint"),
        }
    }
}

#[async_trait]
impl SearchApi for YoutubeSearch {
    async fn search(&self, api_key: &str, query: &SearchQuery) -> Result<String, UpstreamError> {
        let mut params = vec![
            ("key", api_key.to_string()),
            ("part", "snippet".to_string()),
            ("q", query.query.clone()),
            ("type", "video".to_string()),
            ("maxResults", query.limit.to_string()),
            ("videoEmbeddable", "true".to_string()),
            ("safeSearch", "none".to_string()),
        ];
        if let Some(token) = &query.page_token {
            params.push(("pageToken", token.clone()));
        }

        debug!(q = %query.query, limit = query.limit, "upstream search attempt");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&params)
            .send()
            .await
            // Strip the URL from the error: it carries the API key.
            .map_err(|e| UpstreamError::Transport(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::Transport(e.without_url().to_string()))?;

        if (200..300).contains(&status) {
            // A success status with an unparseable body is a transport
            // problem, not a usable response.
            if serde_json::from_str::<serde_json::Value>(&body).is_err() {
                return Err(UpstreamError::Transport(
                    "malformed response body".to_string(),
                ));
            }
            return Ok(body);
        }

        Err(classify_error(status, &body))
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorItem>,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct ErrorItem {
    #[serde(default)]
    reason: String,
}

/// Map a structured upstream error body into the [`UpstreamError`]
/// taxonomy. This is the single place the error envelope is inspected.
pub fn classify_error(status: u16, body: &str) -> UpstreamError {
    let envelope: ErrorEnvelope = match serde_json::from_str(body) {
        Ok(env) => env,
        // An error status with an unreadable body: treat as transport,
        // the next key may see a healthy upstream.
        Err(_) => return UpstreamError::Transport(format!("unparseable error body (HTTP {status})")),
    };

    let Some(error) = envelope.error else {
        return UpstreamError::Rejected {
            status,
            body: body.to_string(),
        };
    };

    let reason = error
        .errors
        .first()
        .map(|e| e.reason.as_str())
        .unwrap_or_default();

    match reason {
        "quotaExceeded" | "dailyLimitExceeded" | "rateLimitExceeded" | "userRateLimitExceeded" => {
            UpstreamError::QuotaExceeded {
                reason: reason.to_string(),
            }
        }
        "keyInvalid" | "keyExpired" => UpstreamError::InvalidCredential {
            reason: reason.to_string(),
        },
        // Newer API deployments report a bad key without a reason code.
        _ if error.message.contains("API key not valid") => UpstreamError::InvalidCredential {
            reason: "keyInvalid".to_string(),
        },
        _ => UpstreamError::Rejected {
            status,
            body: body.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_body(reason: &str, message: &str) -> String {
        format!(
            r#"{{"error":{{"code":403,"message":"{message}","errors":[{{"reason":"{reason}"}}]}}}}"#
        )
    }

    #[test]
    fn test_limit_clamped_into_range() {
        assert_eq!(SearchQuery::new("q", None, 0, 50).limit, 1);
        assert_eq!(SearchQuery::new("q", None, 5, 50).limit, 5);
        assert_eq!(SearchQuery::new("q", None, 500, 50).limit, 50);
    }

    #[test]
    fn test_empty_query_allowed() {
        let q = SearchQuery::new("", None, 5, 50);
        assert_eq!(q.query, "");
    }

    #[test]
    fn test_classify_quota_reasons() {
        for reason in ["quotaExceeded", "dailyLimitExceeded", "rateLimitExceeded"] {
            let err = classify_error(403, &error_body(reason, "quota"));
            assert!(matches!(err, UpstreamError::QuotaExceeded { .. }), "{reason}");
        }
    }

    #[test]
    fn test_classify_bad_key() {
        let err = classify_error(400, &error_body("keyInvalid", "bad key"));
        assert!(matches!(err, UpstreamError::InvalidCredential { .. }));

        // Reasonless envelope with the newer message shape.
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","errors":[]}}"#;
        assert!(matches!(
            classify_error(400, body),
            UpstreamError::InvalidCredential { .. }
        ));
    }

    #[test]
    fn test_classify_other_error_is_rejected_with_body() {
        let body = error_body("invalidSearchFilter", "bad filter");
        let err = classify_error(400, &body);
        match err {
            UpstreamError::Rejected { status, body: b } => {
                assert_eq!(status, 400);
                assert_eq!(b, body);
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_unparseable_body_is_transport() {
        let err = classify_error(502, "<html>bad gateway</html>");
        assert!(matches!(err, UpstreamError::Transport(_)));
    }
}
