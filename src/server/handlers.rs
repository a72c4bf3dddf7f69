//! HTTP request handlers for the web server.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::proxy::ProxyError;
use crate::upstream::SearchQuery;

/// Result count used when the caller does not ask for one.
const DEFAULT_RESULT_COUNT: u32 = 5;

/// Query parameters for `/api/search`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
    #[serde(rename = "pageToken")]
    page_token: Option<String>,
    #[serde(rename = "maxResults")]
    max_results: Option<u32>,
}

/// One video in the flattened search response.
#[derive(Debug, Serialize)]
pub struct VideoItem {
    pub id: String,
    pub title: String,
    pub channel: String,
    #[serde(rename = "channelId")]
    pub channel_id: String,
    pub thumbnail: String,
    pub description: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
}

/// Flattened search response returned to callers.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub items: Vec<VideoItem>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// Handle a search request: proxy it upstream and flatten the result.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let query = SearchQuery::new(
        params.q,
        params.page_token,
        params.max_results.unwrap_or(DEFAULT_RESULT_COUNT),
        state.max_results,
    );

    match state.proxy.handle(&query).await {
        Ok(body) => match flatten_response(&body) {
            Ok(flat) => Json(flat).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "failed to flatten upstream payload");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "Malformed upstream payload" })),
                )
                    .into_response()
            }
        },
        Err(ProxyError::QuotaExhausted) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({ "error": "All API keys exhausted their quota" })),
        )
            .into_response(),
        Err(ProxyError::UpstreamRejected { status, body }) => {
            // Pass upstream's verdict through untouched.
            let status =
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response()
        }
        Err(err @ ProxyError::AllAttemptsFailed { .. }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct RawSearchResponse {
    #[serde(default)]
    items: Vec<RawItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct RawItem {
    #[serde(default)]
    id: serde_json::Value,
    #[serde(default)]
    snippet: RawSnippet,
}

#[derive(Deserialize, Default)]
struct RawSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default, rename = "channelTitle")]
    channel_title: String,
    #[serde(default, rename = "channelId")]
    channel_id: String,
    #[serde(default, rename = "publishedAt")]
    published_at: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Deserialize, Default)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: String,
}

/// Flatten the raw upstream body into the response shape the UI wants.
fn flatten_response(raw: &str) -> Result<SearchResponse, serde_json::Error> {
    let parsed: RawSearchResponse = serde_json::from_str(raw)?;

    let items = parsed
        .items
        .into_iter()
        .map(|item| {
            // Search results carry `{"id": {"videoId": ...}}`; some
            // endpoints return a bare string id.
            let id = item
                .id
                .get("videoId")
                .and_then(|v| v.as_str())
                .or_else(|| item.id.as_str())
                .unwrap_or_default()
                .to_string();

            let snippet = item.snippet;
            let thumbnail = snippet
                .thumbnails
                .medium
                .or(snippet.thumbnails.high)
                .or(snippet.thumbnails.default)
                .map(|t| t.url)
                .unwrap_or_default();

            VideoItem {
                id,
                title: snippet.title,
                channel: snippet.channel_title,
                channel_id: snippet.channel_id,
                thumbnail,
                description: snippet.description,
                published_at: snippet.published_at,
            }
        })
        .collect();

    Ok(SearchResponse {
        items,
        next_page_token: parsed.next_page_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_prefers_medium_thumbnail() {
        let raw = r#"{
            "items": [{
                "id": {"videoId": "v1"},
                "snippet": {
                    "title": "t",
                    "thumbnails": {
                        "default": {"url": "d"},
                        "high": {"url": "h"},
                        "medium": {"url": "m"}
                    }
                }
            }]
        }"#;
        let flat = flatten_response(raw).unwrap();
        assert_eq!(flat.items[0].thumbnail, "m");
    }

    #[test]
    fn test_flatten_falls_back_through_thumbnails() {
        let raw = r#"{
            "items": [{
                "id": {"videoId": "v1"},
                "snippet": {"thumbnails": {"default": {"url": "d"}}}
            }]
        }"#;
        let flat = flatten_response(raw).unwrap();
        assert_eq!(flat.items[0].thumbnail, "d");
    }

    #[test]
    fn test_flatten_accepts_bare_string_id() {
        let raw = r#"{"items": [{"id": "plain", "snippet": {"title": "t"}}]}"#;
        let flat = flatten_response(raw).unwrap();
        assert_eq!(flat.items[0].id, "plain");
    }

    #[test]
    fn test_flatten_empty_items_and_no_token() {
        let flat = flatten_response("{}").unwrap();
        assert!(flat.items.is_empty());
        assert!(flat.next_page_token.is_none());
    }
}
