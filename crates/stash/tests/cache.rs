// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `TieredCache` without a remote tier.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use futures::future::join_all;
use oneflight::FlightAborted;
use pretty_assertions::assert_eq;
use stash::TieredCache;

const TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
enum TestError {
    Upstream(String),
    Aborted(FlightAborted),
}

impl From<FlightAborted> for TestError {
    fn from(aborted: FlightAborted) -> Self {
        Self::Aborted(aborted)
    }
}

fn cache(max_size: usize) -> TieredCache<u32, TestError> {
    TieredCache::builder::<u32, TestError>().max_size(max_size).build()
}

#[tokio::test]
async fn concurrent_misses_run_producer_once() {
    let cache = cache(10);
    let calls = Arc::new(AtomicUsize::new(0));

    let results = join_all((0..16).map(|_| {
        let calls = Arc::clone(&calls);
        cache.get_or_load("key", TTL, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(7)
        })
    }))
    .await;

    assert!(results.iter().all(|result| *result == Ok(7)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.stats().loads, 1);
}

#[tokio::test]
async fn concurrent_failure_is_shared_and_not_cached() {
    let cache = cache(10);
    let calls = Arc::new(AtomicUsize::new(0));

    let results = join_all((0..8).map(|_| {
        let calls = Arc::clone(&calls);
        cache.get_or_load("key", TTL, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err(TestError::Upstream("boom".to_string()))
        })
    }))
    .await;

    assert!(results.iter().all(|result| *result == Err(TestError::Upstream("boom".to_string()))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.get("key").await, None);
    assert_eq!(cache.stats().size, 0);

    let retried = cache.get_or_load("key", TTL, || async { Ok(1) }).await;
    assert_eq!(retried, Ok(1));
    assert_eq!(cache.stats().loads, 2);
}

#[tokio::test(start_paused = true)]
async fn served_until_ttl_elapses() {
    let cache = cache(10);
    cache
        .get_or_load("key", Duration::from_secs(10), || async { Ok(3) })
        .await
        .unwrap();

    tokio::time::advance(Duration::from_millis(9_999)).await;
    assert_eq!(cache.get("key").await, Some(3));

    tokio::time::advance(Duration::from_millis(1)).await;
    assert_eq!(cache.get("key").await, None);
}

#[tokio::test(start_paused = true)]
async fn in_process_ttl_is_capped() {
    let cache = TieredCache::builder::<u32, TestError>()
        .l1_max_ttl(Duration::from_secs(60))
        .build();
    cache
        .get_or_load("key", Duration::from_secs(3_600), || async { Ok(3) })
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(60)).await;
    assert_eq!(cache.get("key").await, None);
}

#[tokio::test]
async fn oldest_insert_is_evicted() {
    let cache = cache(2);
    for (key, value) in [("a", 1), ("b", 2), ("c", 3)] {
        cache.set(key, value, TTL).await.unwrap();
    }

    assert_eq!(cache.get("a").await, None);
    let stats = cache.stats();
    assert_eq!(stats.size, 2);
    assert_eq!(stats.keys, vec!["b".to_string(), "c".to_string()]);
}

#[tokio::test]
async fn size_stays_bounded_after_many_loads() {
    let cache = cache(3);
    for i in 0..7_u32 {
        cache
            .get_or_load(&format!("k{i}"), TTL, move || async move { Ok(i) })
            .await
            .unwrap();
    }

    let stats = cache.stats();
    assert_eq!(stats.size, 3);
    assert_eq!(stats.keys, vec!["k4", "k5", "k6"]);
    for i in 0..4 {
        assert_eq!(cache.get(&format!("k{i}")).await, None);
    }
}

#[tokio::test]
async fn zero_ttl_is_not_cached() {
    let cache = cache(10);
    for _ in 0..2 {
        assert_eq!(cache.get_or_load("key", Duration::ZERO, || async { Ok(5) }).await, Ok(5));
    }
    assert_eq!(cache.stats().loads, 2);
    assert_eq!(cache.stats().size, 0);
}

#[tokio::test]
async fn panicking_producer_reports_aborted() {
    let cache = cache(10);
    let result = cache
        .get_or_load("key", TTL, || async {
            let empty: Vec<u32> = Vec::new();
            Ok(empty[0])
        })
        .await;

    assert_eq!(result, Err(TestError::Aborted(FlightAborted::Panicked)));
    assert_eq!(cache.get_or_load("key", TTL, || async { Ok(1) }).await, Ok(1));
}

#[tokio::test]
async fn abandoned_caller_does_not_cancel_load() {
    let cache = cache(10);
    let slow = cache.get_or_load("key", TTL, || async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(9)
    });
    assert!(tokio::time::timeout(Duration::from_millis(5), slow).await.is_err());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(cache.get("key").await, Some(9));
    assert_eq!(cache.stats().loads, 1);
}

#[tokio::test]
async fn stats_track_hits_and_misses() {
    let cache = cache(10);
    let empty = cache.stats();
    assert_eq!((empty.hits, empty.misses), (0, 0));
    assert!(empty.hit_rate.abs() < f64::EPSILON);

    cache.get_or_load("key", TTL, || async { Ok(1) }).await.unwrap();
    cache.get_or_load("key", TTL, || async { Ok(2) }).await.unwrap();

    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.loads), (1, 1, 1));
    assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    assert_eq!(stats.remote_hits, 0);
}

#[tokio::test]
async fn delete_and_clear_local() {
    let cache = cache(10);
    cache.set("a", 1, TTL).await.unwrap();
    cache.set("b", 2, TTL).await.unwrap();

    cache.delete("a").await.unwrap();
    assert_eq!(cache.get("a").await, None);
    assert_eq!(cache.get("b").await, Some(2));

    cache.clear_local();
    assert_eq!(cache.stats().size, 0);
    assert_eq!(cache.stats().hits, 1, "counters survive clearing");
}

#[tokio::test]
async fn clones_share_state() {
    let cache = cache(10);
    let clone = cache.clone();
    clone.set("key", 4, TTL).await.unwrap();
    assert_eq!(cache.get("key").await, Some(4));
}
