//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::NowPlayingCache;
use crate::store::MokaStore;

/// The cache as served over HTTP: payloads are passed through as raw JSON.
pub type JsonNowPlayingCache = NowPlayingCache<MokaStore, serde_json::Value>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Now-playing cache, written by the worker and read by handlers
    pub cache: Arc<JsonNowPlayingCache>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(cache: Arc<JsonNowPlayingCache>) -> Self {
        Self { cache }
    }
}
