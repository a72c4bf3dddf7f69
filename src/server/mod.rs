//! Web server exposing the search proxy.
//!
//! A single JSON endpoint (`/api/search`) with permissive CORS, matching
//! what the front-end expects during local development.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::cache::SearchCache;
use crate::config::Settings;
use crate::proxy::SearchProxy;
use crate::rotation::KeyRotator;
use crate::upstream::YoutubeSearch;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<SearchProxy>,
    /// Upper bound on the `maxResults` a caller may request.
    pub max_results: u32,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let rotator = KeyRotator::new(settings.api_keys.clone())?;
        let cache = SearchCache::new(settings.cache_ttl);
        let backend = Arc::new(YoutubeSearch::new(settings.upstream_timeout));
        let proxy = Arc::new(SearchProxy::new(rotator, cache, backend));

        Ok(Self {
            proxy,
            max_results: settings.max_results,
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!(
        keys = settings.api_keys.len(),
        "Starting server at http://{}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
