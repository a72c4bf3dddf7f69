//! ytrelay - key-rotating caching proxy for YouTube video search.
//!
//! A small proxy in front of the YouTube Data API v3 search endpoint.
//! Requests are served from a short-lived in-memory cache when possible;
//! on a miss the proxy walks a round-robin rotation of API keys until one
//! succeeds, so a single exhausted quota does not take the service down.

pub mod cache;
pub mod config;
pub mod proxy;
pub mod rotation;
pub mod server;
pub mod upstream;
