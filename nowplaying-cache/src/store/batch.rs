//! Buffered writes.

use std::time::Duration;

/// A single staged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingWrite {
    /// Replace the value at `key`.
    Put {
        key: String,
        value: String,
        ttl: Duration,
    },

    /// Merge `member` into the set at `key`, creating it if absent. The
    /// member stays visible for `ttl`, independent of the other members.
    AddToSet {
        key: String,
        member: String,
        ttl: Duration,
    },
}

impl PendingWrite {
    pub fn key(&self) -> &str {
        match self {
            PendingWrite::Put { key, .. } | PendingWrite::AddToSet { key, .. } => key,
        }
    }
}

/// Writes accumulated in memory until committed.
///
/// Writes are applied in staging order. Every write resets the expiry of its
/// key to the write's TTL.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    writes: Vec<PendingWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>, ttl: Duration) {
        self.writes.push(PendingWrite::Put {
            key: key.into(),
            value: value.into(),
            ttl,
        });
    }

    pub fn add_to_set(&mut self, key: impl Into<String>, member: impl Into<String>, ttl: Duration) {
        self.writes.push(PendingWrite::AddToSet {
            key: key.into(),
            member: member.into(),
            ttl,
        });
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingWrite> {
        self.writes.iter()
    }
}

impl IntoIterator for WriteBatch {
    type Item = PendingWrite;
    type IntoIter = std::vec::IntoIter<PendingWrite>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}
