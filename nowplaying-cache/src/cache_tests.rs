//! Behavioural tests for the now-playing cache as a whole.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cache::NowPlayingCache;
use crate::clock::ManualClock;
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::lookup::{LOOKUP_KEY, lookup_entry_key};
use crate::station::{Station, StationId};
use crate::station_entry::station_key;
use crate::store::{KeyValueStore, MokaStore, StoreError, WriteBatch};

const T0: i64 = 1_700_000_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NowPlaying {
    song: String,
    elapsed: u32,
    listeners: u32,
}

fn np(song: &str) -> NowPlaying {
    NowPlaying {
        song: song.to_string(),
        elapsed: 42,
        listeners: 7,
    }
}

struct Harness {
    cache: NowPlayingCache<MokaStore, NowPlaying>,
    store: Arc<MokaStore>,
    clock: ManualClock,
}

fn harness() -> Harness {
    let clock = ManualClock::new(T0);
    let config = CacheConfig::default();
    let store = Arc::new(MokaStore::with_clock(&config, Arc::new(clock.clone())));
    let cache = NowPlayingCache::with_clock(store.clone(), &config, Arc::new(clock.clone()));
    Harness {
        cache,
        store,
        clock,
    }
}

#[tokio::test]
async fn round_trip_by_id_and_short_name() {
    let h = harness();
    let station = Station::new(1, "azuratest_radio", true);
    h.cache
        .set_for_station(&station, Some(&np("Song A")))
        .await
        .unwrap();

    assert_eq!(
        h.cache.get_for_station(station.id).await.unwrap(),
        Some(np("Song A"))
    );
    assert_eq!(
        h.cache.get_for_identifier("1").await.unwrap(),
        Some(np("Song A"))
    );
    assert_eq!(
        h.cache.get_for_identifier("azuratest_radio").await.unwrap(),
        Some(np("Song A"))
    );
}

#[tokio::test]
async fn id_and_name_agree_for_the_whole_ttl() {
    let h = harness();
    let station = Station::new(12, "late night/talk", false);
    h.cache
        .set_for_station(&station, Some(&np("Call-in")))
        .await
        .unwrap();

    for offset in [0, 60, 120, 179] {
        h.clock.set(T0 + offset);
        let by_id = h.cache.get_for_station(station.id).await.unwrap();
        let by_name = h.cache.get_for_station(&station).await.unwrap();
        assert_eq!(by_id, by_name, "at +{offset}s");
        assert!(by_id.is_some(), "at +{offset}s");
    }
}

#[tokio::test]
async fn visibility_filter() {
    let h = harness();
    let stations = [
        Station::new(1, "public_a", true),
        Station::new(2, "private_b", false),
        Station::new(3, "public_c", true),
        Station::new(4, "private_d", false),
    ];
    for station in &stations {
        h.cache
            .set_for_station(station, Some(&np(&station.short_name)))
            .await
            .unwrap();
    }
    // A public station that is listed but has nothing playing.
    h.cache
        .set_for_station(&Station::new(5, "public_silent", true), None)
        .await
        .unwrap();

    let public = h.cache.get_for_all_stations(true).await.unwrap();
    assert_eq!(public, vec![np("public_a"), np("public_c")]);

    let all = h.cache.get_for_all_stations(false).await.unwrap();
    assert_eq!(
        all,
        vec![np("public_a"), np("private_b"), np("public_c"), np("private_d")]
    );
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let h = harness();
    let station = Station::new(1, "rock", true);
    h.cache
        .set_for_station(&station, Some(&np("Song")))
        .await
        .unwrap();

    h.clock.set(T0 + 179);
    assert!(h.cache.get_for_station(station.id).await.unwrap().is_some());
    assert!(h.cache.get_for_identifier("rock").await.unwrap().is_some());
    assert_eq!(h.cache.get_lookup().await.unwrap().len(), 1);

    h.clock.set(T0 + 181);
    assert_eq!(h.cache.get_for_station(station.id).await.unwrap(), None);
    assert_eq!(h.cache.get_for_identifier("rock").await.unwrap(), None);
    assert!(h.cache.get_lookup().await.unwrap().is_empty());
    assert!(h.cache.get_for_all_stations(false).await.unwrap().is_empty());

    // A fresh write brings the station straight back.
    h.cache
        .set_for_station(&station, Some(&np("Next")))
        .await
        .unwrap();
    assert_eq!(
        h.cache.get_for_station(station.id).await.unwrap(),
        Some(np("Next"))
    );
}

#[tokio::test]
async fn force_update_keeps_payload() {
    let h = harness();
    let station = Station::new(3, "jazz", true);
    h.cache
        .set_for_station(&station, Some(&np("So What")))
        .await
        .unwrap();

    h.clock.advance(Duration::from_secs(30));
    h.cache.force_update(&station).await.unwrap();

    assert_eq!(
        h.cache.get_for_station(station.id).await.unwrap(),
        Some(np("So What"))
    );
    let lookup = h.cache.get_lookup().await.unwrap();
    assert_eq!(lookup.get(station.id).unwrap().last_updated, 0);
}

#[tokio::test]
async fn force_update_moves_station_to_front_of_queue() {
    let h = harness();
    let early = Station::new(1, "early", true);
    let late = Station::new(2, "late", true);

    h.cache.set_for_station(&early, Some(&np("a"))).await.unwrap();
    h.clock.advance(Duration::from_secs(10));
    h.cache.set_for_station(&late, Some(&np("b"))).await.unwrap();

    let lookup = h.cache.get_lookup().await.unwrap();
    assert_eq!(lookup.stalest().map(|(id, _)| id), Some(early.id));

    h.cache.force_update(&late).await.unwrap();
    let lookup = h.cache.get_lookup().await.unwrap();
    assert_eq!(lookup.stalest().map(|(id, _)| id), Some(late.id));
    // The other station's schedule is untouched.
    assert_eq!(lookup.get(early.id).unwrap().last_updated, T0);
}

#[tokio::test]
async fn station_without_entry_is_omitted() {
    let h = harness();
    for (id, name) in [(1, "one"), (2, "two"), (3, "three")] {
        h.cache
            .set_for_station(&Station::new(id, name, true), Some(&np(name)))
            .await
            .unwrap();
    }

    h.store.invalidate(&station_key("two")).await;

    assert_eq!(h.cache.get_lookup().await.unwrap().len(), 3);
    assert_eq!(
        h.cache.get_for_all_stations(false).await.unwrap(),
        vec![np("one"), np("three")]
    );
}

#[tokio::test]
async fn unknown_identifier_is_not_found() {
    let h = harness();
    h.cache
        .set_for_station(&Station::new(1, "rock", true), Some(&np("a")))
        .await
        .unwrap();

    assert_eq!(
        h.cache.get_for_identifier("no-such-station").await.unwrap(),
        None
    );
    assert_eq!(h.cache.get_for_identifier("404").await.unwrap(), None);
    assert_eq!(h.cache.get_for_identifier("").await.unwrap(), None);
    assert_eq!(
        h.cache
            .get_for_identifier("99999999999999999999")
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn numeric_short_name_is_reachable_by_its_digits() {
    let h = harness();
    let station = Station::new(5, "1985", true);
    h.cache
        .set_for_station(&station, Some(&np("Take On Me")))
        .await
        .unwrap();

    // no station has ID 1985, so the digits are tried as a short name
    assert_eq!(
        h.cache.get_for_identifier("1985").await.unwrap(),
        Some(np("Take On Me"))
    );
    assert_eq!(
        h.cache.get_for_identifier("5").await.unwrap(),
        Some(np("Take On Me"))
    );
    assert_eq!(
        h.cache.get_for_station(StationId::new(1985)).await.unwrap(),
        Some(np("Take On Me"))
    );
}

#[tokio::test]
async fn known_id_wins_over_numeric_short_name() {
    let h = harness();
    h.cache
        .set_for_station(&Station::new(7, "news", true), Some(&np("Headlines")))
        .await
        .unwrap();
    h.cache
        .set_for_station(&Station::new(8, "7", true), Some(&np("Lucky Seven")))
        .await
        .unwrap();

    assert_eq!(
        h.cache.get_for_identifier("7").await.unwrap(),
        Some(np("Headlines"))
    );
}

#[tokio::test]
async fn failed_set_leaves_nothing_behind() {
    let h = harness();
    let station = Station::new(1, "rock", true);

    // a scalar where the known-ID set should be makes the commit fail
    let mut batch = WriteBatch::new();
    batch.put(LOOKUP_KEY, "{}", Duration::from_secs(180));
    h.store.commit(batch).await.unwrap();

    assert!(matches!(
        h.cache.set_for_station(&station, Some(&np("Paranoid"))).await,
        Err(CacheError::Backend(StoreError::WrongType { .. }))
    ));

    assert_eq!(h.cache.get_for_station(station.id).await.unwrap(), None);
    assert_eq!(h.cache.get_for_identifier("rock").await.unwrap(), None);
    assert_eq!(h.store.get(&lookup_entry_key(station.id)).await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_do_not_lose_stations() {
    let h = harness();
    let cache = Arc::new(h.cache);

    let writers: Vec<_> = (1..=64u32)
        .map(|id| {
            let cache = cache.clone();
            tokio::spawn(async move {
                let station = Station::new(id, format!("station_{id}"), id % 2 == 0);
                cache
                    .set_for_station(&station, Some(&np(&station.short_name)))
                    .await
            })
        })
        .collect();

    for writer in writers {
        writer.await.unwrap().unwrap();
    }

    let lookup = cache.get_lookup().await.unwrap();
    assert_eq!(lookup.len(), 64);
    assert_eq!(cache.get_for_all_stations(false).await.unwrap().len(), 64);
    assert_eq!(cache.get_for_all_stations(true).await.unwrap().len(), 32);
}

#[tokio::test]
async fn corrupt_payload_surfaces_as_error() {
    let h = harness();
    let station = Station::new(1, "rock", true);
    h.cache
        .set_for_station(&station, Some(&np("a")))
        .await
        .unwrap();

    let mut batch = WriteBatch::new();
    batch.put(station_key("rock"), "[1, 2, 3]", Duration::from_secs(180));
    h.store.commit(batch).await.unwrap();

    assert!(matches!(
        h.cache.get_for_station(station.id).await,
        Err(CacheError::Corrupt { key, .. }) if key == station_key("rock")
    ));
    assert!(matches!(
        h.cache.get_for_all_stations(false).await,
        Err(CacheError::Corrupt { .. })
    ));
}

#[tokio::test]
async fn corrupt_lookup_entry_surfaces_as_error() {
    let h = harness();
    let station = Station::new(1, "rock", true);
    h.cache
        .set_for_station(&station, Some(&np("a")))
        .await
        .unwrap();

    let mut batch = WriteBatch::new();
    batch.put(
        lookup_entry_key(StationId::new(1)),
        "\"rock\"",
        Duration::from_secs(180),
    );
    h.store.commit(batch).await.unwrap();

    assert!(matches!(
        h.cache.get_for_station(station.id).await,
        Err(CacheError::Corrupt { .. })
    ));
    assert!(matches!(
        h.cache.get_lookup().await,
        Err(CacheError::Corrupt { .. })
    ));
}

proptest! {
    /// Any station written is readable by both ID and short name
    #[test]
    fn round_trip_any_station(
        id in any::<u32>(),
        short_name in "[a-zA-Z_][a-zA-Z0-9 _./&%+-]{0,24}",
        is_public in any::<bool>(),
        song in ".{0,40}",
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let h = harness();
            let station = Station::new(id, short_name.clone(), is_public);
            let payload = np(&song);
            h.cache.set_for_station(&station, Some(&payload)).await.unwrap();

            let by_id = h.cache.get_for_identifier(&id.to_string()).await.unwrap();
            let by_name = h.cache.get_for_identifier(&short_name).await.unwrap();
            prop_assert_eq!(by_id.as_ref(), Some(&payload));
            prop_assert_eq!(by_name.as_ref(), Some(&payload));
            Ok(())
        })?;
    }
}
