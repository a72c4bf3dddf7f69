//! Search proxy: cache lookup plus key-failover loop.
//!
//! The proxy is the only component with policy in it. A request is
//! served from cache when possible; otherwise it walks the key rotation
//! once around, retrying on failures that are specific to a key (quota,
//! bad credential, network trouble) and aborting on failures that would
//! repeat identically on every key.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::SearchCache;
use crate::rotation::KeyRotator;
use crate::upstream::{SearchApi, SearchQuery, UpstreamError};

/// Terminal outcome of a failed proxy request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Every configured key reported quota exhaustion.
    #[error("all API keys exhausted their quota")]
    QuotaExhausted,

    /// Upstream rejected the request itself; retrying on another key
    /// would fail the same way. Carries the upstream body verbatim.
    #[error("upstream rejected request (HTTP {status})")]
    UpstreamRejected { status: u16, body: String },

    /// The rotation was exhausted without a success or a rejection.
    #[error("all attempts failed: {detail}")]
    AllAttemptsFailed { detail: String },
}

/// Caching, key-rotating front for the upstream search API.
pub struct SearchProxy {
    rotator: KeyRotator,
    cache: SearchCache,
    backend: Arc<dyn SearchApi>,
}

impl SearchProxy {
    pub fn new(rotator: KeyRotator, cache: SearchCache, backend: Arc<dyn SearchApi>) -> Self {
        Self {
            rotator,
            cache,
            backend,
        }
    }

    /// Serve a search request, returning the raw upstream response body.
    ///
    /// A live cache hit returns immediately without touching the key
    /// rotation: no credential was consumed, so none is charged. On a
    /// miss, each configured key gets at most one attempt.
    ///
    /// Dropping the returned future aborts the loop between attempts;
    /// a cancelled request never writes a cache entry.
    pub async fn handle(&self, query: &SearchQuery) -> Result<String, ProxyError> {
        let cache_key = SearchCache::key(&query.query, query.page_token.as_deref(), query.limit);

        if let Some(body) = self.cache.get(&cache_key) {
            debug!(key = %cache_key, "cache hit");
            return Ok(body);
        }

        let mut last_error: Option<UpstreamError> = None;

        for attempt in 1..=self.rotator.key_count() {
            let api_key = self.rotator.next();

            match self.backend.search(api_key, query).await {
                Ok(body) => {
                    self.cache.put(cache_key.clone(), body.clone());
                    return Ok(body);
                }
                Err(UpstreamError::Rejected { status, body }) => {
                    // A malformed request fails identically on every
                    // key; surface upstream's answer as-is.
                    warn!(attempt, status, "upstream rejected request");
                    return Err(ProxyError::UpstreamRejected { status, body });
                }
                Err(err) => {
                    warn!(attempt, error = %err, "attempt failed, rotating key");
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(UpstreamError::QuotaExceeded { .. }) => Err(ProxyError::QuotaExhausted),
            Some(err) => Err(ProxyError::AllAttemptsFailed {
                detail: err.to_string(),
            }),
            None => Err(ProxyError::AllAttemptsFailed {
                detail: "no attempts made".to_string(),
            }),
        }
    }
}
