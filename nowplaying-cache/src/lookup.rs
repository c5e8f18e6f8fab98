//! Lookup index: the station directory.
//!
//! Maps station ID to `{short_name, is_public, last_updated}` so callers can
//! address a station by ID even though payloads are keyed by short name.
//!
//! Each station's entry lives under its own key, and a set key lists the
//! known IDs. Writers for different stations therefore never overwrite each
//! other's entries; the set membership is merged atomically by the store.
//! An ID stays in the set exactly as long as its own entry, so the set never
//! accumulates stations that stopped reporting.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{CacheError, decode, encode};
use crate::station::{Station, StationId};
use crate::store::{KeyValueStore, WriteBatch};

/// Set key listing every station ID with a lookup entry.
pub const LOOKUP_KEY: &str = "now_playing.lookup";

/// Key holding one station's lookup entry.
pub fn lookup_entry_key(id: StationId) -> String {
    format!("{LOOKUP_KEY}.{id}")
}

/// Directory information for one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupEntry {
    pub short_name: String,
    pub is_public: bool,

    /// Unix time of the last payload refresh. Zero means the station should
    /// be refreshed next.
    pub last_updated: i64,
}

impl LookupEntry {
    /// True when a force update asked for this station to be refreshed.
    pub fn needs_refresh(&self) -> bool {
        self.last_updated == 0
    }
}

/// Snapshot of the lookup index, iterated in ascending ID order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LookupIndex {
    entries: BTreeMap<StationId, LookupEntry>,
}

impl LookupIndex {
    pub fn get(&self, id: StationId) -> Option<&LookupEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StationId, &LookupEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    /// The station refreshed longest ago, lowest ID first on ties.
    ///
    /// Force-updated stations carry `last_updated == 0` and so always win.
    pub fn stalest(&self) -> Option<(StationId, &LookupEntry)> {
        self.iter().min_by_key(|(id, entry)| (entry.last_updated, *id))
    }
}

impl FromIterator<(StationId, LookupEntry)> for LookupIndex {
    fn from_iter<I: IntoIterator<Item = (StationId, LookupEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Reads and stages writes to the lookup index.
pub struct LookupStore<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl<S: KeyValueStore> LookupStore<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    /// Stage the entry for `station`, replacing any previous one.
    ///
    /// `updated_at` defaults to now. Nothing is visible until the batch is
    /// committed.
    pub fn upsert(
        &self,
        batch: &mut WriteBatch,
        station: &Station,
        updated_at: Option<i64>,
    ) -> Result<(), CacheError> {
        let key = lookup_entry_key(station.id);
        let entry = LookupEntry {
            short_name: station.short_name.clone(),
            is_public: station.is_public,
            last_updated: updated_at.unwrap_or_else(|| self.clock.now()),
        };

        batch.put(key.as_str(), encode(&key, &entry)?, self.ttl);
        batch.add_to_set(LOOKUP_KEY, station.id.to_string(), self.ttl);
        Ok(())
    }

    /// Read the lookup entry for a single station.
    pub async fn entry(&self, id: StationId) -> Result<Option<LookupEntry>, CacheError> {
        let key = lookup_entry_key(id);
        match self.store.get(&key).await? {
            Some(raw) => decode(&key, &raw).map(Some),
            None => Ok(None),
        }
    }

    /// Read the whole index. An absent index is empty; IDs whose own entry
    /// has expired are left out.
    pub async fn read(&self) -> Result<LookupIndex, CacheError> {
        let ids = self
            .store
            .members(LOOKUP_KEY)
            .await?
            .iter()
            .map(|member| {
                member
                    .parse::<StationId>()
                    .map_err(|e| CacheError::corrupt(LOOKUP_KEY, e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let entries = try_join_all(ids.iter().map(|id| self.entry(*id))).await?;

        Ok(ids
            .into_iter()
            .zip(entries)
            .filter_map(|(id, entry)| entry.map(|entry| (id, entry)))
            .collect())
    }
}
