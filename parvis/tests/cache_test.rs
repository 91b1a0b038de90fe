// Copyright 2026 parvis Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end tests for the caching façade over both backends.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use hashbrown::HashMap;
use parvis::{
    Cache, CacheBuilder, Clock, EntryOptions, Error, ManualClock, ObjectBackend, RemoteBackend,
    Timestamp, ENVELOPE_HEADER_LEN,
};
use parvis_remote::test_utils::MemoryByteStore;
use rand::Rng;
use tokio::sync::Notify;

type MemoryCache<V> = Cache<V, ObjectBackend<V>>;
type RemoteCache<V> = Cache<V, RemoteBackend<V, MemoryByteStore>>;

fn start() -> Timestamp {
    Timestamp::from_unix_millis(1_700_000_000_000)
}

fn memory_cache<V: Send + Sync + 'static>() -> (Arc<ManualClock>, MemoryCache<V>) {
    let clock = Arc::new(ManualClock::new(start()));
    let cache = CacheBuilder::new().with_clock(clock.clone()).memory().unwrap();
    (clock, cache)
}

async fn get_with_retry<V: Send + Sync + 'static>(
    cache: &MemoryCache<V>,
    key: &str,
    predicate: impl Fn(&V) -> bool,
) -> bool {
    for _ in 0..100 {
        if let Some(value) = cache.get(key).await.unwrap() {
            if predicate(&value) {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[test_log::test(tokio::test)]
async fn test_set_then_get() {
    let (_clock, cache) = memory_cache::<String>();
    cache.set("item", "value".to_string(), &EntryOptions::new()).await.unwrap();

    let got = cache.get("item").await.unwrap().unwrap();
    assert_eq!(got.as_str(), "value");

    let snapshot = cache.metrics().snapshot();
    assert_eq!(snapshot.hits, 1);
    assert_eq!(snapshot.sets, 1);
    assert_eq!(snapshot.size, 1);
}

#[test_log::test(tokio::test)]
async fn test_get_missing() {
    let (_clock, cache) = memory_cache::<String>();
    assert!(cache.get("missing").await.unwrap().is_none());

    let snapshot = cache.metrics().snapshot();
    assert_eq!(snapshot.misses, 1);
    assert_eq!(snapshot.size, 0);
}

#[test_log::test(tokio::test)]
async fn test_invalid_keys_touch_no_state() {
    let (_clock, cache) = memory_cache::<String>();

    assert!(matches!(cache.get("").await, Err(Error::InvalidKey(_))));
    assert!(matches!(cache.exists("  ").await, Err(Error::InvalidKey(_))));
    assert!(matches!(
        cache.set("\t", "v".to_string(), &EntryOptions::new()).await,
        Err(Error::InvalidKey(_))
    ));
    assert!(matches!(cache.remove("").await, Err(Error::InvalidKey(_))));
    assert!(matches!(cache.invalidate_tag(" ").await, Err(Error::InvalidTag(_))));

    assert_eq!(cache.metrics().snapshot(), Default::default());
}

#[test_log::test(tokio::test)]
async fn test_inconsistent_options_fail_before_factory() {
    let (_clock, cache) = memory_cache::<String>();
    let invoked = Arc::new(AtomicUsize::new(0));

    let counter = invoked.clone();
    let result = cache
        .get_or_set(
            "k",
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("v".to_string())
            },
            &EntryOptions::new()
                .with_ttl(Duration::from_secs(1))
                .with_sliding(Duration::from_secs(1)),
        )
        .await;

    assert!(matches!(result, Err(Error::InvalidOptions(_))));
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
    assert_eq!(cache.metrics().snapshot(), Default::default());
}

#[test_log::test(tokio::test)]
async fn test_exists() {
    let (clock, cache) = memory_cache::<String>();
    cache
        .set("k", "v".to_string(), &EntryOptions::new().with_ttl(Duration::from_secs(5)))
        .await
        .unwrap();

    assert!(cache.exists("k").await.unwrap());
    clock.advance(Duration::from_secs(6));
    assert!(!cache.exists("k").await.unwrap());

    let snapshot = cache.metrics().snapshot();
    assert_eq!(snapshot.hits, 1);
    assert_eq!(snapshot.evictions, 1);
    assert_eq!(snapshot.size, 0);
}

#[test_log::test(tokio::test)]
async fn test_repeated_set_and_unknown_remove_do_not_drift_size() {
    let (_clock, cache) = memory_cache::<String>();
    cache.set("k", "v1".to_string(), &EntryOptions::new()).await.unwrap();
    cache.set("k", "v2".to_string(), &EntryOptions::new()).await.unwrap();
    cache.remove("unknown").await.unwrap();

    let snapshot = cache.metrics().snapshot();
    assert_eq!(snapshot.sets, 2);
    assert_eq!(snapshot.size, 1);
    assert_eq!(snapshot.removals, 1);
    assert_eq!(cache.get("k").await.unwrap().unwrap().as_str(), "v2");
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_stampede_protection_runs_factory_once() {
    let (_clock, cache) = memory_cache::<i32>();
    let invoked = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = cache.clone();
            let invoked = invoked.clone();
            tokio::spawn(async move {
                cache
                    .get_or_set(
                        "k",
                        move || async move {
                            invoked.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok(42)
                        },
                        &EntryOptions::new(),
                    )
                    .await
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(*handle.await.unwrap(), 42);
    }
    assert_eq!(invoked.load(Ordering::SeqCst), 1);
    let snapshot = cache.metrics().snapshot();
    assert_eq!(snapshot.misses, 1);
    assert_eq!(snapshot.sets, 1);
    assert_eq!(snapshot.size, 1);
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_stampede_protection_disabled() {
    let clock = Arc::new(ManualClock::new(start()));
    let cache: MemoryCache<i32> = CacheBuilder::new()
        .with_clock(clock)
        .with_stampede_protection(false)
        .memory()
        .unwrap();
    let invoked = Arc::new(AtomicUsize::new(0));

    let run = |cache: MemoryCache<i32>, invoked: Arc<AtomicUsize>| async move {
        cache
            .get_or_set(
                "k",
                move || async move {
                    invoked.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(7)
                },
                &EntryOptions::new(),
            )
            .await
            .unwrap()
    };

    // Interleave four callers on one task so all of them observe the miss.
    let (a, b, c, d) = tokio::join!(
        run(cache.clone(), invoked.clone()),
        run(cache.clone(), invoked.clone()),
        run(cache.clone(), invoked.clone()),
        run(cache.clone(), invoked.clone()),
    );
    assert_eq!((*a, *b, *c, *d), (7, 7, 7, 7));
    // Without coalescing every caller runs the factory.
    assert_eq!(invoked.load(Ordering::SeqCst), 4);
}

#[test_log::test(tokio::test)]
async fn test_factory_error_propagates_and_writes_nothing() {
    let (_clock, cache) = memory_cache::<String>();

    let result = cache
        .get_or_set(
            "k",
            || async { Err::<String, _>(anyhow::anyhow!("backing store down")) },
            &EntryOptions::new(),
        )
        .await;
    match result {
        Err(Error::Factory(source)) => assert_eq!(source.to_string(), "backing store down"),
        other => panic!("expected factory error, got {other:?}"),
    }

    let snapshot = cache.metrics().snapshot();
    assert_eq!(snapshot.misses, 1);
    assert_eq!(snapshot.sets, 0);
    assert_eq!(snapshot.size, 0);

    // The lease was released: the next population succeeds.
    let value = cache
        .get_or_set("k", || async { Ok("recovered".to_string()) }, &EntryOptions::new())
        .await
        .unwrap();
    assert_eq!(value.as_str(), "recovered");
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_stale_while_revalidate() {
    let (clock, cache) = memory_cache::<i32>();
    let options = EntryOptions::new()
        .with_ttl(Duration::from_secs(5))
        .with_stale_ttl(Duration::from_secs(30));

    cache.set("x", 1, &options).await.unwrap();
    clock.advance(Duration::from_secs(6));

    // The stale value comes back synchronously while the refresh runs detached.
    let stale = cache
        .get_or_set("x", || async { Ok(2) }, &options)
        .await
        .unwrap();
    assert_eq!(*stale, 1);

    assert!(get_with_retry(&cache, "x", |v| *v == 2).await);
    let snapshot = cache.metrics().snapshot();
    assert_eq!(snapshot.stale_hits, 1);
    assert!(snapshot.hits >= 1);
    assert_eq!(snapshot.size, 1);
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_swr_returns_without_waiting_for_factory() {
    let (clock, cache) = memory_cache::<i32>();
    let options = EntryOptions::new()
        .with_ttl(Duration::from_secs(5))
        .with_stale_ttl(Duration::from_secs(30));
    cache.set("x", 1, &options).await.unwrap();
    clock.advance(Duration::from_secs(6));

    // A refresh that never completes must not block the stale read.
    let gate = Arc::new(Notify::new());
    let blocked = gate.clone();
    let started = std::time::Instant::now();
    let stale = cache
        .get_or_set(
            "x",
            move || async move {
                blocked.notified().await;
                Ok(2)
            },
            &options,
        )
        .await
        .unwrap();
    assert_eq!(*stale, 1);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_concurrent_stale_reads_trigger_one_refresh() {
    let (clock, cache) = memory_cache::<i32>();
    let options = EntryOptions::new()
        .with_ttl(Duration::from_secs(5))
        .with_stale_ttl(Duration::from_secs(60));
    cache.set("x", 1, &options).await.unwrap();
    clock.advance(Duration::from_secs(6));

    let started = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Notify::new());

    for _ in 0..5 {
        let started = started.clone();
        let gate = gate.clone();
        let stale = cache
            .get_or_set(
                "x",
                move || async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    gate.notified().await;
                    Ok(2)
                },
                &options,
            )
            .await
            .unwrap();
        assert_eq!(*stale, 1);
    }

    // Give the lone refresh task a chance to start, then release it.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(started.load(Ordering::SeqCst) <= 1);
    gate.notify_one();
    assert!(get_with_retry(&cache, "x", |v| *v == 2).await);
    assert_eq!(started.load(Ordering::SeqCst), 1);
}

#[test_log::test(tokio::test)]
async fn test_swr_disabled_repopulates_synchronously() {
    let clock = Arc::new(ManualClock::new(start()));
    let cache: MemoryCache<i32> = CacheBuilder::new()
        .with_clock(clock.clone())
        .with_stale_while_revalidate(false)
        .memory()
        .unwrap();
    let options = EntryOptions::new()
        .with_ttl(Duration::from_secs(5))
        .with_stale_ttl(Duration::from_secs(30));

    cache.set("x", 1, &options).await.unwrap();
    clock.advance(Duration::from_secs(6));

    let value = cache.get_or_set("x", || async { Ok(2) }, &options).await.unwrap();
    assert_eq!(*value, 2);

    let snapshot = cache.metrics().snapshot();
    assert_eq!(snapshot.stale_hits, 1);
    assert_eq!(snapshot.misses, 1);
}

#[test_log::test(tokio::test)]
async fn test_tag_invalidation() {
    let (_clock, cache) = memory_cache::<String>();
    cache
        .set("p", "v".to_string(), &EntryOptions::new().with_tag("products"))
        .await
        .unwrap();
    cache
        .set("q", "w".to_string(), &EntryOptions::new().with_tags(["products", "featured"]))
        .await
        .unwrap();
    cache.set("r", "x".to_string(), &EntryOptions::new()).await.unwrap();

    cache.invalidate_tag("products").await.unwrap();

    assert!(cache.get("p").await.unwrap().is_none());
    assert!(cache.get("q").await.unwrap().is_none());
    assert!(cache.get("r").await.unwrap().is_some());

    let snapshot = cache.metrics().snapshot();
    assert_eq!(snapshot.removals, 2);
    assert_eq!(snapshot.size, 1);
}

#[test_log::test(tokio::test)]
async fn test_tag_union_removes_each_key_once() {
    let (_clock, cache) = memory_cache::<String>();
    cache
        .set("k", "v".to_string(), &EntryOptions::new().with_tags(["a", "b"]))
        .await
        .unwrap();

    cache.invalidate_tags(["a", "b"]).await.unwrap();
    assert_eq!(cache.metrics().snapshot().removals, 1);

    // Empty tag collections are a no-op.
    cache.invalidate_tags(Vec::<String>::new()).await.unwrap();
    assert_eq!(cache.metrics().snapshot().removals, 1);
}

#[test_log::test(tokio::test)]
async fn test_set_replaces_tag_set() {
    let (_clock, cache) = memory_cache::<String>();
    cache
        .set("k", "v1".to_string(), &EntryOptions::new().with_tag("old"))
        .await
        .unwrap();
    cache.set("k", "v2".to_string(), &EntryOptions::new()).await.unwrap();

    // The second set carried no tags, so the old tag no longer reaches the key.
    cache.invalidate_tag("old").await.unwrap();
    assert!(cache.get("k").await.unwrap().is_some());
}

#[test_log::test(tokio::test)]
async fn test_sliding_entries_stay_fresh_while_touched() {
    let (clock, cache) = memory_cache::<String>();
    let options = EntryOptions::new().with_sliding(Duration::from_secs(10));
    cache.set("k", "v".to_string(), &options).await.unwrap();

    for _ in 0..5 {
        clock.advance(Duration::from_secs(8));
        assert!(cache.get("k").await.unwrap().is_some());
    }

    clock.advance(Duration::from_secs(11));
    assert!(cache.get("k").await.unwrap().is_none());
    assert_eq!(cache.metrics().snapshot().evictions, 1);
}

#[test_log::test(tokio::test)]
async fn test_category_defaults_apply() {
    let clock = Arc::new(ManualClock::new(start()));
    let cache: MemoryCache<String> = CacheBuilder::new()
        .with_clock(clock.clone())
        .with_category(
            "short-lived",
            EntryOptions::new().with_ttl(Duration::from_secs(2)),
        )
        .memory()
        .unwrap();

    cache
        .set("k", "v".to_string(), &EntryOptions::new().with_category("short-lived"))
        .await
        .unwrap();
    assert!(cache.get("k").await.unwrap().is_some());
    clock.advance(Duration::from_secs(3));
    assert!(cache.get("k").await.unwrap().is_none());

    assert!(matches!(
        cache
            .set("k", "v".to_string(), &EntryOptions::new().with_category("nope"))
            .await,
        Err(Error::UnknownCategory(_))
    ));
}

#[test_log::test(tokio::test)]
async fn test_remote_backend_envelope_and_corruption() {
    let clock = Arc::new(ManualClock::new(start()));
    let store = MemoryByteStore::new();
    let cache: RemoteCache<String> = CacheBuilder::new()
        .with_clock(clock.clone())
        .remote(store.clone())
        .unwrap();

    cache
        .set("k", "value!".to_string(), &EntryOptions::new().with_ttl(Duration::from_secs(60)))
        .await
        .unwrap();

    // The stored blob leads with the fixed header.
    let blob = store.raw("k").unwrap();
    assert_eq!(blob.len(), ENVELOPE_HEADER_LEN + "value!".len());
    assert_eq!(&blob[0..8], start().as_unix_millis().to_le_bytes());
    assert_eq!(cache.get("k").await.unwrap().unwrap().as_str(), "value!");

    // Garbling a payload byte turns the read into an eviction and purges the key.
    let mut corrupted = blob.to_vec();
    corrupted[40] = 0xFF;
    store.put_raw("k", bytes::Bytes::from(corrupted));

    assert!(cache.get("k").await.unwrap().is_none());
    assert!(store.raw("k").is_none());
    let snapshot = cache.metrics().snapshot();
    assert_eq!(snapshot.evictions, 1);
    assert_eq!(snapshot.size, 0);
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_remote_backend_get_or_set() {
    let clock = Arc::new(ManualClock::new(start()));
    let cache: RemoteCache<u64> = CacheBuilder::new()
        .with_clock(clock.clone())
        .remote(MemoryByteStore::new())
        .unwrap();

    let value = cache
        .get_or_set("answer", || async { Ok(42u64) }, &EntryOptions::new())
        .await
        .unwrap();
    assert_eq!(*value, 42);
    assert_eq!(*cache.get("answer").await.unwrap().unwrap(), 42);

    let snapshot = cache.metrics().snapshot();
    assert_eq!(snapshot.misses, 1);
    assert_eq!(snapshot.hits, 1);
    assert_eq!(snapshot.size, 1);
}

#[test_log::test(tokio::test)]
async fn test_size_tracks_installed_keys_under_random_ops() {
    let (clock, cache) = memory_cache::<u64>();
    let keys: Vec<String> = (0..8).map(|i| format!("key-{i}")).collect();
    // Mirror of the façade's view: key → absolute expiration millis.
    let mut mirror: HashMap<String, i64> = HashMap::new();
    let mut installs: u64 = 0;
    let mut rng = rand::rng();

    for _ in 0..1_000 {
        let key = &keys[rng.random_range(0..keys.len())];
        match rng.random_range(0..4) {
            0 => {
                let ttl = Duration::from_secs(rng.random_range(1..10));
                cache
                    .set(key, rng.random_range(0..u64::MAX), &EntryOptions::new().with_ttl(ttl))
                    .await
                    .unwrap();
                if mirror.insert(key.clone(), clock.now().saturating_add(ttl).as_unix_millis()).is_none() {
                    installs += 1;
                }
            }
            1 => {
                let got = cache.get(key).await.unwrap();
                match mirror.get(key) {
                    Some(deadline) if clock.now().as_unix_millis() <= *deadline => assert!(got.is_some()),
                    Some(_) => {
                        assert!(got.is_none());
                        mirror.remove(key);
                    }
                    None => assert!(got.is_none()),
                }
            }
            2 => {
                cache.remove(key).await.unwrap();
                mirror.remove(key);
            }
            _ => clock.advance(Duration::from_millis(rng.random_range(100..3_000))),
        }

        let snapshot = cache.metrics().snapshot();
        assert_eq!(snapshot.size as usize, mirror.len());
        assert!(snapshot.sets >= installs);
        // Every key that left the installed set was accounted as an eviction or removal.
        assert!(snapshot.evictions + snapshot.removals >= installs - snapshot.size);
    }
}
