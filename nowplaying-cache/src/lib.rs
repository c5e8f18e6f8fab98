//! Now-playing cache.
//!
//! A TTL-bounded, two-tier cache for the "currently playing" state of many
//! broadcast stations. A lookup index maps station IDs to short names and
//! freshness timestamps; per-station entries hold the payloads.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod lookup;
pub mod station;
pub mod station_entry;
pub mod store;
pub mod web;

#[cfg(test)]
mod cache_tests;

pub use cache::NowPlayingCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, ConfigError};
pub use error::CacheError;
pub use lookup::{LookupEntry, LookupIndex};
pub use station::{InvalidStationRef, Station, StationId, StationRef};
pub use store::{KeyValueStore, MokaStore, StoreError, WriteBatch};
