// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the circuit breaker as seen through `FetchClient`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use steadfetch::testing::{Reply, ScriptedUpstream};
use steadfetch::{BreakerOptions, CircuitBreaker, FetchClient, FetchError, FetchOptions, JsonValidator};
use tracing_test::traced_test;

type Client = FetchClient<ScriptedUpstream, JsonValidator<Value>>;

fn client(upstream: &ScriptedUpstream) -> Client {
    FetchClient::builder(upstream.clone(), JsonValidator::new())
        .name("breaker-tests")
        .build()
}

async fn fail_times(client: &Client, times: usize) {
    for _ in 0..times {
        let error = client.fetch("acme").await.unwrap_err();
        assert!(!matches!(error, FetchError::CircuitOpen { .. }), "{error:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn opens_after_threshold_and_recovers_after_cooldown() {
    let upstream = ScriptedUpstream::new(Reply::Hang);
    let client = client(&upstream);

    fail_times(&client, 5).await;
    assert!(client.circuit_state().is_open());
    assert_eq!(client.circuit_state().consecutive_failures(), 5);
    assert_eq!(upstream.calls(), 15);

    upstream.clear_calls();
    let error = client.fetch("acme").await.unwrap_err();
    assert!(matches!(error, FetchError::CircuitOpen { .. }), "{error:?}");
    assert!(error.is_unavailable());
    assert_eq!(upstream.calls(), 0);

    tokio::time::advance(Duration::from_secs(31)).await;
    upstream.set_fallback(Reply::Json(json!({ "id": "acme" })));

    let document = client.fetch("acme").await.unwrap();
    assert_eq!(document["id"], "acme");
    assert_eq!(upstream.calls(), 1);

    let state = client.circuit_state();
    assert!(!state.is_open());
    assert_eq!(state.consecutive_failures(), 0);
    assert_eq!(state.opened_at(), None);
}

#[tokio::test(start_paused = true)]
async fn rejection_reports_remaining_cooldown() {
    let upstream = ScriptedUpstream::new(Reply::Status(500));
    let client = client(&upstream);
    fail_times(&client, 5).await;

    tokio::time::advance(Duration::from_secs(10)).await;

    match client.fetch("acme").await {
        Err(FetchError::CircuitOpen { retry_after }) => assert_eq!(retry_after, Duration::from_secs(20)),
        other => panic!("expected an open circuit, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn failed_trial_restarts_cooldown() {
    let upstream = ScriptedUpstream::new(Reply::Status(500));
    let client = client(&upstream);
    fail_times(&client, 5).await;

    tokio::time::advance(Duration::from_secs(31)).await;
    upstream.clear_calls();

    let error = client.fetch("acme").await.unwrap_err();
    assert_eq!(error, FetchError::Http { status: 500 });
    assert_eq!(upstream.calls(), 3);
    assert!(client.circuit_state().is_open());
    assert_eq!(client.circuit_state().consecutive_failures(), 6);

    tokio::time::advance(Duration::from_secs(29)).await;
    assert!(matches!(client.fetch("acme").await, Err(FetchError::CircuitOpen { .. })));
    assert_eq!(upstream.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn success_resets_failure_count_before_threshold() {
    let upstream = ScriptedUpstream::new(Reply::Status(500));
    let client = client(&upstream);
    fail_times(&client, 4).await;
    assert_eq!(client.circuit_state().consecutive_failures(), 4);

    upstream.push(Reply::Json(json!({})));
    client.fetch("acme").await.unwrap();
    assert_eq!(client.circuit_state().consecutive_failures(), 0);

    fail_times(&client, 4).await;
    assert!(!client.circuit_state().is_open());
}

#[tokio::test(start_paused = true)]
async fn validation_failures_leave_breaker_alone() {
    let upstream = ScriptedUpstream::new(Reply::Body(200, b"nope".to_vec()));
    let client = client(&upstream);

    for _ in 0..10 {
        assert!(matches!(client.fetch("acme").await, Err(FetchError::Validation(_))));
    }

    assert_eq!(client.circuit_state().consecutive_failures(), 0);
    assert!(!client.circuit_state().is_open());
}

#[tokio::test(start_paused = true)]
async fn shared_breaker_guards_every_client() {
    let breaker = Arc::new(CircuitBreaker::new(BreakerOptions {
        trip_threshold: 2,
        cooldown: Duration::from_secs(5),
    }));
    let failing = ScriptedUpstream::new(Reply::Status(503));
    let healthy = ScriptedUpstream::json(json!({}));

    let first = FetchClient::builder(failing, JsonValidator::<Value>::new())
        .breaker(Arc::clone(&breaker))
        .build();
    let second = FetchClient::builder(healthy.clone(), JsonValidator::<Value>::new())
        .breaker(Arc::clone(&breaker))
        .build();

    first.fetch("a").await.unwrap_err();
    first.fetch("a").await.unwrap_err();

    assert!(matches!(second.fetch("b").await, Err(FetchError::CircuitOpen { .. })));
    assert_eq!(healthy.calls(), 0);

    tokio::time::advance(Duration::from_secs(5)).await;
    second.fetch("b").await.unwrap();
    assert!(!first.circuit_state().is_open());
}

#[tokio::test(start_paused = true)]
async fn breaker_options_come_from_fetch_options() {
    let upstream = ScriptedUpstream::new(Reply::Status(500));
    let options = FetchOptions {
        attempts: 1,
        breaker: BreakerOptions {
            trip_threshold: 1,
            cooldown: Duration::from_secs(1),
        },
        ..FetchOptions::default()
    };
    let client = FetchClient::builder(upstream.clone(), JsonValidator::<Value>::new())
        .options(options)
        .build();

    client.fetch("acme").await.unwrap_err();
    assert!(matches!(client.fetch("acme").await, Err(FetchError::CircuitOpen { .. })));
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn trip_is_reported() {
    let upstream = ScriptedUpstream::new(Reply::Status(500));
    let trips = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&trips);

    let client = FetchClient::builder(upstream, JsonValidator::<Value>::new())
        .on_circuit_opened(move |args| {
            assert_eq!(args.cooldown(), Duration::from_secs(30));
            counter.store(args.consecutive_failures(), Ordering::Relaxed);
        })
        .build();

    fail_times(&client, 4).await;
    assert_eq!(trips.load(Ordering::Relaxed), 0);

    fail_times(&client, 1).await;
    assert_eq!(trips.load(Ordering::Relaxed), 5);
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn open_and_close_are_logged() {
    let upstream = ScriptedUpstream::new(Reply::Status(500));
    let client = client(&upstream);
    fail_times(&client, 5).await;

    assert!(logs_contain("circuit.consecutive_failures=5"));

    tokio::time::advance(Duration::from_secs(30)).await;
    upstream.set_fallback(Reply::Json(json!({})));
    client.fetch("acme").await.unwrap();

    assert!(logs_contain("breaker-tests"));
    assert!(logs_contain("INFO"));
}
