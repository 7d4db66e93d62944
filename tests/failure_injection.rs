//! Upstream failure behavior: consumed slots are never refunded.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde_json::Value;

mod common;

async fn usage(client: &reqwest::Client, gate: &common::RunningGate, ip: &str) -> u64 {
    let body: Value = client
        .get(gate.url("/api/ratelimit"))
        .header("x-forwarded-for", ip)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["used"].as_u64().unwrap()
}

#[tokio::test]
async fn upstream_errors_still_consume_quota() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let upstream = common::start_programmable_upstream(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (500, r#"{"error":"scanner crashed"}"#.to_string())
        }
    })
    .await;

    let gate = common::start_gate(common::gate_config(upstream, 2)).await;
    let client = common::client();

    for _ in 0..2 {
        let res = client
            .post(gate.url("/api/scan"))
            .header("x-forwarded-for", "203.0.113.77")
            .body("{}")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 500);
    }
    assert_eq!(usage(&client, &gate, "203.0.113.77").await, 2);

    let res = client
        .post(gate.url("/api/scan"))
        .header("x-forwarded-for", "203.0.113.77")
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 429);
    assert_eq!(calls.load(Ordering::SeqCst), 2, "rejected scan must not reach upstream");

    gate.stop().await;
}

#[tokio::test]
async fn unreachable_upstream_returns_bad_gateway_without_refund() {
    let upstream = common::closed_port().await;
    let gate = common::start_gate(common::gate_config(upstream, 3)).await;
    let client = common::client();

    let res = client
        .post(gate.url("/api/scan"))
        .header("x-forwarded-for", "198.51.100.200")
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 502);
    assert_eq!(
        res.headers().get("x-ratelimit-remaining").unwrap().to_str().unwrap(),
        "2"
    );

    assert_eq!(usage(&client, &gate, "198.51.100.200").await, 1);

    gate.stop().await;
}

#[tokio::test]
async fn timed_out_scan_keeps_quota_headers() {
    let upstream = common::start_programmable_upstream(|| async {
        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        (200, "{}".to_string())
    })
    .await;

    let mut config = common::gate_config(upstream, 3);
    config.timeouts.request_secs = 1;
    let gate = common::start_gate(config).await;
    let client = common::client();

    let res = client
        .post(gate.url("/api/scan"))
        .header("x-forwarded-for", "192.0.2.150")
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 408);
    assert_eq!(
        res.headers().get("x-ratelimit-limit").unwrap().to_str().unwrap(),
        "3"
    );
    assert_eq!(
        res.headers().get("x-ratelimit-remaining").unwrap().to_str().unwrap(),
        "2"
    );
    assert!(res.headers().get("x-ratelimit-reset").is_some());

    assert_eq!(usage(&client, &gate, "192.0.2.150").await, 1);

    gate.stop().await;
}
