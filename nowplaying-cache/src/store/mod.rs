//! Key/value storage behind the cache.
//!
//! Writes are never applied one at a time: callers stage them in a
//! [`WriteBatch`] and hand the whole batch to [`KeyValueStore::commit`].
//! A failed commit is a failure of the entire batch, and a batch rejected
//! for the shape of its writes leaves the store unchanged.

mod batch;
mod moka_store;

use std::future::Future;

pub use batch::{PendingWrite, WriteBatch};
pub use moka_store::MokaStore;

/// Errors from the backing store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or refused the operation
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A key holds a value of a different shape than the operation expects
    #[error("wrong value type at key {key}")]
    WrongType { key: String },
}

/// A TTL-aware key/value store shared by readers and writers.
///
/// Values are opaque strings. Expired keys are indistinguishable from keys
/// that were never written.
pub trait KeyValueStore: Send + Sync {
    /// Fetch a scalar value.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Fetch the live members of a set-valued key, empty if absent.
    fn members(&self, key: &str) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// Apply every write in `batch`.
    fn commit(&self, batch: WriteBatch) -> impl Future<Output = Result<(), StoreError>> + Send;
}
