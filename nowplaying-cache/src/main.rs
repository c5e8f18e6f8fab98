use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use nowplaying_cache::web::{AppState, create_router};
use nowplaying_cache::{CacheConfig, MokaStore, NowPlayingCache};

/// Listen address used when `NOWPLAYING_ADDR` is unset.
const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = CacheConfig::from_env()?;
    let addr: SocketAddr = std::env::var("NOWPLAYING_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;

    let store = Arc::new(MokaStore::new(&config));
    let cache = NowPlayingCache::new(store, &config);
    let app = create_router(AppState::new(Arc::new(cache)));

    tracing::info!(
        %addr,
        ttl_secs = config.ttl.as_secs(),
        max_capacity = config.max_capacity,
        "now-playing cache listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
