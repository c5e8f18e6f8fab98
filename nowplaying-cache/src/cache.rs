//! Now-playing cache facade.
//!
//! Writers (the periodic now-playing worker) push fully computed payloads
//! with [`NowPlayingCache::set_for_station`]; readers fetch them by station ID
//! or short name. Payloads and the lookup index share one TTL, so a station
//! whose worker stops simply drops out of the cache.

use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::lookup::{LookupIndex, LookupStore};
use crate::station::{Station, StationRef};
use crate::station_entry::StationEntries;
use crate::store::{KeyValueStore, WriteBatch};

/// Two-tier now-playing cache over a shared key/value store.
pub struct NowPlayingCache<S, P> {
    store: Arc<S>,
    lookup: LookupStore<S>,
    entries: StationEntries<S, P>,
}

impl<S, P> NowPlayingCache<S, P>
where
    S: KeyValueStore,
    P: Serialize + DeserializeOwned + Send,
{
    /// Create a cache stamping freshness with the wall clock.
    pub fn new(store: Arc<S>, config: &CacheConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Create a cache stamping freshness with `clock`.
    pub fn with_clock(store: Arc<S>, config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            lookup: LookupStore::new(store.clone(), clock, config.ttl),
            entries: StationEntries::new(store.clone(), config.ttl),
            store,
        }
    }

    /// Store the payload for `station` and mark it freshly updated.
    ///
    /// `None` records that the station is currently not playing anything.
    /// The payload and the lookup entry are committed in one batch.
    pub async fn set_for_station(
        &self,
        station: &Station,
        payload: Option<&P>,
    ) -> Result<(), CacheError> {
        let mut batch = WriteBatch::new();
        // Payload first so the directory never points at a missing update.
        self.entries.write(&mut batch, &station.short_name, payload)?;
        self.lookup.upsert(&mut batch, station, None)?;

        self.store.commit(batch).await?;
        tracing::debug!(station = %station.short_name, id = %station.id, "stored now-playing payload");
        Ok(())
    }

    /// Fetch the payload for a station by ID or short name.
    ///
    /// An ID missing from the lookup index is tried as a short name made of
    /// the same digits. Returns `Ok(None)` for unknown stations and cache
    /// misses.
    pub async fn get_for_station(
        &self,
        station: impl Into<StationRef>,
    ) -> Result<Option<P>, CacheError> {
        let short_name = self.resolve(&station.into()).await?;
        self.entries.read(&short_name).await
    }

    /// Fetch the payload for a raw identifier, classifying it as an ID when it
    /// is all digits and as a short name otherwise.
    pub async fn get_for_identifier(&self, identifier: &str) -> Result<Option<P>, CacheError> {
        match StationRef::parse(identifier) {
            Ok(station) => self.get_for_station(station).await,
            Err(e) => {
                tracing::debug!(identifier, error = %e, "unusable station identifier");
                Ok(None)
            }
        }
    }

    /// Fetch every cached payload, optionally only for public stations.
    ///
    /// Stations without a cached payload are left out.
    pub async fn get_for_all_stations(&self, public_only: bool) -> Result<Vec<P>, CacheError> {
        let index = self.lookup.read().await?;

        let reads = index
            .iter()
            .filter(|(_, entry)| !public_only || entry.is_public)
            .map(|(_, entry)| self.entries.read(&entry.short_name));

        let payloads = try_join_all(reads).await?;
        Ok(payloads.into_iter().flatten().collect())
    }

    /// The lookup index as currently cached.
    pub async fn get_lookup(&self) -> Result<LookupIndex, CacheError> {
        self.lookup.read().await
    }

    /// Ask the now-playing worker to refresh `station` next.
    ///
    /// Sets the station's `last_updated` to zero without touching its payload,
    /// so readers keep seeing the last known state until the worker catches up.
    pub async fn force_update(&self, station: &Station) -> Result<(), CacheError> {
        let mut batch = WriteBatch::new();
        self.lookup.upsert(&mut batch, station, Some(0))?;

        self.store.commit(batch).await?;
        tracing::info!(station = %station.short_name, id = %station.id, "forced now-playing update");
        Ok(())
    }

    /// Map a station reference to the short name its payload is stored under.
    async fn resolve(&self, station: &StationRef) -> Result<String, CacheError> {
        match station {
            StationRef::ShortName(name) => Ok(name.clone()),
            StationRef::Id(id) => match self.lookup.entry(*id).await? {
                Some(entry) => Ok(entry.short_name),
                None => {
                    tracing::debug!(%id, "station ID not in lookup index, trying it as a short name");
                    Ok(id.to_string())
                }
            },
        }
    }
}
