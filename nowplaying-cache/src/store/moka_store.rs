//! In-process store backed by moka.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ::moka::Expiry;
use ::moka::future::Cache as MokaCache;
use ::moka::ops::compute::Op;
use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;

use super::{KeyValueStore, PendingWrite, StoreError, WriteBatch};

/// Set members mapped to the logical time each one stops being visible.
type Members = BTreeMap<String, i64>;

#[derive(Debug, Clone)]
enum StoredValue {
    Scalar(Arc<str>),
    Set(Arc<Members>),
}

/// A value plus the logical time it stops being visible.
///
/// moka evicts on real time; `expires_at` is checked against the store's
/// clock on every read so that an injected clock decides visibility.
#[derive(Debug, Clone)]
struct StoredEntry {
    value: StoredValue,
    ttl: Duration,
    expires_at: i64,
}

impl StoredEntry {
    fn new(value: StoredValue, ttl: Duration, now: i64) -> Self {
        Self {
            value,
            ttl,
            expires_at: expiry_after(ttl, now),
        }
    }

    /// A set lives as long as its longest-lived member.
    fn set(members: Members, now: i64) -> Self {
        let expires_at = members.values().copied().max().unwrap_or(now);
        let ttl = Duration::from_secs(u64::try_from(expires_at.saturating_sub(now)).unwrap_or(0));
        Self {
            value: StoredValue::Set(Arc::new(members)),
            ttl,
            expires_at,
        }
    }

    fn is_live(&self, now: i64) -> bool {
        now < self.expires_at
    }
}

fn expiry_after(ttl: Duration, now: i64) -> i64 {
    let secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    now.saturating_add(secs)
}

/// Per-entry TTL: set on create, reset on every write, untouched by reads.
struct EntryExpiry;

impl Expiry<String, StoredEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// moka-backed [`KeyValueStore`].
///
/// Commits are serialized against each other; readers never wait on them.
/// A batch is checked in full before its first write lands, so a rejected
/// commit leaves the store untouched. Set merges are atomic per key, and
/// each set member expires on its own TTL.
pub struct MokaStore {
    entries: MokaCache<String, StoredEntry>,
    clock: Arc<dyn Clock>,
    commit_lock: Mutex<()>,
}

impl MokaStore {
    /// Create a store driven by the wall clock.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a store whose expiry is judged by `clock`.
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryExpiry)
            .build();

        Self {
            entries,
            clock,
            commit_lock: Mutex::new(()),
        }
    }

    /// Drop a single key, as if it had expired.
    pub async fn invalidate(&self, key: &str) {
        self.entries.invalidate(key).await;
    }

    /// Number of keys currently held (for monitoring; may include keys that
    /// are logically expired but not yet evicted).
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Reject the batch if any set write targets a scalar, counting scalars
    /// staged earlier in the same batch. Must run under the commit lock.
    async fn check_batch(&self, batch: &WriteBatch, now: i64) -> Result<(), StoreError> {
        // key -> holds a set once the batch has been applied up to here
        let mut staged: HashMap<&str, bool> = HashMap::new();

        for write in batch.iter() {
            match write {
                PendingWrite::Put { key, .. } => {
                    staged.insert(key, false);
                }
                PendingWrite::AddToSet { key, .. } => {
                    let is_set = match staged.get(key.as_str()) {
                        Some(is_set) => *is_set,
                        None => !matches!(
                            self.live_value_at(key, now).await,
                            Some(StoredValue::Scalar(_))
                        ),
                    };
                    if !is_set {
                        return Err(StoreError::WrongType { key: key.clone() });
                    }
                    staged.insert(key, true);
                }
            }
        }

        Ok(())
    }

    async fn add_member(
        &self,
        key: String,
        member: String,
        ttl: Duration,
        now: i64,
    ) -> Result<(), StoreError> {
        let mut wrong_type = false;

        self.entries
            .entry(key.clone())
            .and_compute_with(|existing| {
                let live = existing
                    .map(|entry| entry.into_value())
                    .filter(|entry| entry.is_live(now));

                let op = match live.map(|entry| entry.value) {
                    Some(StoredValue::Scalar(_)) => {
                        wrong_type = true;
                        Op::Nop
                    }
                    Some(StoredValue::Set(members)) => {
                        let mut members = (*members).clone();
                        members.retain(|_, expires_at| now < *expires_at);
                        members.insert(member, expiry_after(ttl, now));
                        Op::Put(StoredEntry::set(members, now))
                    }
                    None => Op::Put(StoredEntry::set(
                        Members::from([(member, expiry_after(ttl, now))]),
                        now,
                    )),
                };
                std::future::ready(op)
            })
            .await;

        if wrong_type {
            return Err(StoreError::WrongType { key });
        }
        Ok(())
    }

    async fn live_value_at(&self, key: &str, now: i64) -> Option<StoredValue> {
        self.entries
            .get(key)
            .await
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value)
    }
}

impl KeyValueStore for MokaStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.live_value_at(key, self.clock.now()).await {
            None => Ok(None),
            Some(StoredValue::Scalar(value)) => Ok(Some(value.to_string())),
            Some(StoredValue::Set(_)) => Err(StoreError::WrongType {
                key: key.to_string(),
            }),
        }
    }

    async fn members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let now = self.clock.now();
        match self.live_value_at(key, now).await {
            None => Ok(Vec::new()),
            Some(StoredValue::Set(members)) => Ok(members
                .iter()
                .filter(|(_, expires_at)| now < **expires_at)
                .map(|(member, _)| member.clone())
                .collect()),
            Some(StoredValue::Scalar(_)) => Err(StoreError::WrongType {
                key: key.to_string(),
            }),
        }
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let _guard = self.commit_lock.lock().await;
        let now = self.clock.now();

        self.check_batch(&batch, now).await?;

        for write in batch {
            match write {
                PendingWrite::Put { key, value, ttl } => {
                    let entry = StoredEntry::new(StoredValue::Scalar(value.into()), ttl, now);
                    self.entries.insert(key, entry).await;
                }
                PendingWrite::AddToSet { key, member, ttl } => {
                    self.add_member(key, member, ttl, now).await?;
                }
            }
        }

        Ok(())
    }
}
