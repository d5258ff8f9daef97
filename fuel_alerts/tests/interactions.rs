mod common;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::TimeDelta;
use common::{ASTRAHUS, FORTIZAR, FakeApi, JITA, RecordingNotifier, structure};
use fuel_alerts::interactions::{InteractionResponse, router};
use fuel_alerts::responder::{ACK_MESSAGE, ResponderSettings, ResponseMode, StatusResponder};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

type Responder = StatusResponder<FakeApi, RecordingNotifier>;

fn settings(initial_estimate: Duration) -> ResponderSettings {
    ResponderSettings {
        deadline: Duration::from_secs(3),
        initial_estimate,
        max_entries: 5,
        max_message_len: 2000,
    }
}

fn fleet() -> Vec<shared::esi::StructureDto> {
    vec![
        structure(1, "Jita - Fortizar", JITA, FORTIZAR, Some(TimeDelta::hours(30))),
        structure(2, "Jita - Astrahus", JITA, ASTRAHUS, Some(TimeDelta::hours(6))),
        structure(3, "Idle", JITA, ASTRAHUS, None),
    ]
}

fn app(api: FakeApi, initial_estimate: Duration) -> (Router, Arc<Responder>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let responder = Arc::new(StatusResponder::new(
        Arc::new(api),
        Arc::clone(&notifier),
        settings(initial_estimate),
    ));
    (router(Arc::clone(&responder), "fuel"), responder, notifier)
}

async fn post(app: Router, body: serde_json::Value) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri("/interactions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn command(app: Router, name: &str) -> InteractionResponse {
    let (status, body) = post(app, json!({ "type": 2, "data": { "name": name } })).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

fn content(response: &InteractionResponse) -> &str {
    &response.data.as_ref().unwrap().content
}

async fn wait_for_delivery(notifier: &RecordingNotifier) -> Vec<String> {
    for _ in 0..100 {
        let sent = notifier.sent();
        if !sent.is_empty() {
            return sent;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("nothing was delivered");
}

#[tokio::test(start_paused = true)]
async fn health_is_ok() {
    let (app, _, _) = app(FakeApi::new(Vec::new()), Duration::from_secs(1));
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn ping_is_answered_with_pong() {
    let (app, _, _) = app(FakeApi::new(Vec::new()), Duration::from_secs(1));
    let (status, body) = post(app, json!({ "type": 1 })).await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "type": 1 }));
}

#[tokio::test(start_paused = true)]
async fn unsupported_interaction_type_is_rejected() {
    let (app, _, _) = app(FakeApi::new(Vec::new()), Duration::from_secs(1));
    let (status, _) = post(app, json!({ "type": 3 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn command_without_data_is_rejected() {
    let (app, _, _) = app(FakeApi::new(Vec::new()), Duration::from_secs(1));
    let (status, _) = post(app, json!({ "type": 2 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn unknown_command_gets_a_hint() {
    let (app, _, notifier) = app(FakeApi::new(fleet()), Duration::from_secs(1));
    let response = command(app, "fuels").await;
    assert_eq!(content(&response), "Unknown command `fuels`");
    assert!(notifier.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn fast_fetch_is_answered_inline() {
    let (app, responder, notifier) = app(FakeApi::new(fleet()), Duration::from_secs(1));
    assert_eq!(responder.mode(), ResponseMode::Synchronous);

    let response = command(app, "fuel").await;

    assert_eq!(response.kind, 4);
    let text = content(&response);
    assert!(text.starts_with("⛽ Fuel status for 2 structures"), "{text}");
    let astrahus = text.find("**Jita - Astrahus**").unwrap();
    let fortizar = text.find("**Jita - Fortizar**").unwrap();
    assert!(astrahus < fortizar);
    assert!(!text.contains("Idle"));
    assert!(notifier.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_estimate_acknowledges_and_posts_later() {
    let (app, responder, notifier) = app(FakeApi::new(fleet()), Duration::from_secs(5));
    assert_eq!(responder.mode(), ResponseMode::Deferred);

    let response = command(app, "fuel").await;
    assert_eq!(content(&response), ACK_MESSAGE);

    let sent = wait_for_delivery(&notifier).await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("⛽ Fuel status for 2 structures"));
}

#[tokio::test(start_paused = true)]
async fn overrunning_fetch_falls_back_to_deferred_delivery() {
    let mut api = FakeApi::new(fleet());
    api.listing_delay = Duration::from_secs(10);
    let (app, responder, notifier) = app(api, Duration::from_secs(1));
    assert_eq!(responder.mode(), ResponseMode::Synchronous);

    let response = command(app, "fuel").await;
    assert_eq!(content(&response), ACK_MESSAGE);

    let sent = wait_for_delivery(&notifier).await;
    assert!(sent[0].contains("**Jita - Astrahus**"));
    // (1s * 3 + 10s) / 4 leaves no room inside the deadline.
    assert_eq!(responder.mode(), ResponseMode::Deferred);
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_is_reported_to_the_caller() {
    let mut api = FakeApi::new(fleet());
    api.fail_listing = true;
    let (app, _, notifier) = app(api, Duration::from_secs(1));

    let response = command(app, "fuel").await;

    let text = content(&response);
    assert!(text.starts_with("❌ Could not fetch fuel status"), "{text}");
    assert!(text.contains("503"));
    assert!(notifier.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn large_listing_is_truncated_inline() {
    let structures = (0..12)
        .map(|i| structure(100 + i, &format!("Citadel {i:02}"), JITA, FORTIZAR, Some(TimeDelta::hours(i + 1))))
        .collect();
    let (app, _, _) = app(FakeApi::new(structures), Duration::from_secs(1));

    let response = command(app, "fuel").await;

    let text = content(&response);
    assert_eq!(text.matches("**Citadel").count(), 5);
    assert!(text.ends_with("…and 7 more"));
}
