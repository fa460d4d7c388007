// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `CacheEntry`.

use std::time::Duration;

use stash_tier::CacheEntry;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn served_strictly_before_expiry() {
    let now = Instant::now();
    let entry = CacheEntry::expiring_at("value", now + Duration::from_secs(30));

    assert!(!entry.is_expired_at(now));
    assert!(!entry.is_expired_at(now + Duration::from_millis(29_999)));
    assert!(entry.is_expired_at(now + Duration::from_secs(30)));
    assert!(entry.is_expired_at(now + Duration::from_secs(31)));
}

#[tokio::test(start_paused = true)]
async fn new_measures_ttl_from_now() {
    let entry = CacheEntry::new(42, Duration::from_secs(300));
    assert_eq!(entry.expires_at(), Instant::now() + Duration::from_secs(300));
    assert_eq!(entry.remaining_ttl(), Duration::from_secs(300));
}

#[test]
fn value_accessors() {
    let entry = CacheEntry::expiring_at(String::from("hello"), Instant::now());

    assert_eq!(entry.value(), "hello");
    assert_eq!(entry.len(), 5, "deref exposes the inner value");
    assert_eq!(entry.into_value(), "hello");
}

#[test]
fn clone_and_equality() {
    let at = Instant::now();
    let entry = CacheEntry::expiring_at(vec![1, 2, 3], at);
    let cloned = entry.clone();

    assert_eq!(entry, cloned);
    assert_ne!(entry, CacheEntry::expiring_at(vec![1, 2, 3], at + Duration::from_secs(1)));
}
