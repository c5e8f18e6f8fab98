//! Per-station payload storage, addressed by short name.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{CacheError, decode, encode};
use crate::store::{KeyValueStore, WriteBatch};

const STATION_KEY_PREFIX: &str = "now_playing.station_";

/// Key holding a station's payload.
///
/// Short names may contain characters that are unsafe in the key space, so
/// the whole key is percent-encoded.
pub fn station_key(short_name: &str) -> String {
    urlencoding::encode(&format!("{STATION_KEY_PREFIX}{short_name}")).into_owned()
}

/// Reads and stages writes of now-playing payloads.
///
/// A stored `None` means "currently not playing anything" and reads back as
/// absent.
pub struct StationEntries<S, P> {
    store: Arc<S>,
    ttl: Duration,
    _payload: PhantomData<fn() -> P>,
}

impl<S, P> StationEntries<S, P>
where
    S: KeyValueStore,
    P: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<S>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            _payload: PhantomData,
        }
    }

    /// Stage `payload` for `short_name`. Does not flush.
    pub fn write(
        &self,
        batch: &mut WriteBatch,
        short_name: &str,
        payload: Option<&P>,
    ) -> Result<(), CacheError> {
        let key = station_key(short_name);
        let value = encode(&key, &payload)?;
        batch.put(key, value, self.ttl);
        Ok(())
    }

    /// Read the payload for `short_name`, if present and unexpired.
    pub async fn read(&self, short_name: &str) -> Result<Option<P>, CacheError> {
        let key = station_key(short_name);
        match self.store.get(&key).await? {
            Some(raw) => decode::<Option<P>>(&key, &raw),
            None => {
                tracing::debug!(short_name, "now-playing cache miss");
                Ok(None)
            }
        }
    }
}
