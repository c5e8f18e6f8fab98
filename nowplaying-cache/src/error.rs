//! Cache error types.
//!
//! A cache miss is never an error; these cover a failing backend and values
//! that cannot have been written by this crate.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::store::StoreError;

/// Errors returned by cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The backing store failed; the whole operation failed with it
    #[error("backend error: {0}")]
    Backend(#[from] StoreError),

    /// A stored value could not be decoded
    #[error("corrupt value at {key}: {message}")]
    Corrupt { key: String, message: String },

    /// A value could not be encoded for storage
    #[error("failed to encode value for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CacheError {
    /// Build a corruption error and log it.
    ///
    /// Only this crate writes to its key namespace, so a value it cannot read
    /// back points at a real bug.
    pub(crate) fn corrupt(key: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(key, %message, "undecodable value in now-playing namespace");
        CacheError::Corrupt {
            key: key.to_string(),
            message,
        }
    }
}

pub(crate) fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, CacheError> {
    serde_json::to_string(value).map_err(|source| CacheError::Encode {
        key: key.to_string(),
        source,
    })
}

pub(crate) fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, CacheError> {
    serde_json::from_str(raw).map_err(|e| CacheError::corrupt(key, e.to_string()))
}
