//! Integration tests for webhook ingestion.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::http::StatusCode;
use hookbox_api::RequestLimits;
use hookbox_core::{EventHandler, IngestEvent, WebhookResult};
use hookbox_testing::{send, webhook_request, MessageBuilder, TestEnv};
use serde_json::json;

#[derive(Debug, Default)]
struct RecordingHandler {
    events: Mutex<Vec<IngestEvent>>,
}

impl EventHandler for RecordingHandler {
    fn handle_event(&self, event: &IngestEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[tokio::test]
async fn first_delivery_is_stored() {
    let env = TestEnv::new().await.unwrap();
    let body = MessageBuilder::with_defaults().message_id("m1").text("Hi there").body();

    let response = env.post_webhook(body).await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "status": "ok" }));

    let stored = env.storage().messages.find_by_id("m1").await.unwrap().unwrap();
    assert_eq!(stored.from_msisdn, "+919876543210");
    assert_eq!(stored.to_msisdn, "+14155550100");
    assert_eq!(stored.ts, "2025-01-15T10:00:00Z");
    assert_eq!(stored.text.as_deref(), Some("Hi there"));
    assert_eq!(stored.created_at, "2025-01-01T10:00:00.000000Z");
    assert_eq!(env.counters().webhook_count(WebhookResult::Created), 1);
}

#[tokio::test]
async fn duplicate_delivery_returns_identical_response_without_write() {
    let env = TestEnv::new().await.unwrap();
    let body = MessageBuilder::with_defaults().message_id("m1").body();

    let first = env.post_webhook(body.clone()).await.unwrap();
    env.clock.advance(Duration::from_secs(60));
    let second = env.post_webhook(body).await.unwrap();

    assert_eq!(first.status, second.status);
    assert_eq!(first.body, second.body);
    assert_eq!(env.message_count().await.unwrap(), 1);

    let stored = env.storage().messages.find_by_id("m1").await.unwrap().unwrap();
    assert_eq!(stored.created_at, "2025-01-01T10:00:00.000000Z", "first write wins");

    assert_eq!(env.counters().webhook_count(WebhookResult::Created), 1);
    assert_eq!(env.counters().webhook_count(WebhookResult::Duplicate), 1);
}

#[tokio::test]
async fn same_id_with_different_content_is_still_a_duplicate() {
    let env = TestEnv::new().await.unwrap();

    env.post_webhook(MessageBuilder::with_defaults().message_id("m1").text("one").body())
        .await
        .unwrap();
    let response = env
        .post_webhook(MessageBuilder::with_defaults().message_id("m1").text("two").body())
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    let stored = env.storage().messages.find_by_id("m1").await.unwrap().unwrap();
    assert_eq!(stored.text.as_deref(), Some("one"));
}

#[tokio::test]
async fn text_is_optional() {
    let env = TestEnv::new().await.unwrap();
    let body = MessageBuilder::with_defaults().message_id("m1").without_text().body();

    let response = env.post_webhook(body).await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    let stored = env.storage().messages.find_by_id("m1").await.unwrap().unwrap();
    assert!(stored.text.is_none());
}

#[tokio::test]
async fn missing_fields_are_rejected_in_order() {
    let env = TestEnv::new().await.unwrap();

    let cases = [
        (MessageBuilder::with_defaults().without_from().without_to(), "Missing 'from' field"),
        (MessageBuilder::with_defaults().without_to(), "Missing 'to' field"),
        (MessageBuilder::with_defaults().message_id(""), "Empty message_id"),
    ];

    for (builder, reason) in cases {
        let response = env.post_webhook(builder.body()).await.unwrap();

        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY, "{reason}");
        assert_eq!(response.json(), json!({ "detail": reason }));
    }

    let no_id = json!({ "from": "+1", "to": "+2", "ts": "2025-01-01T00:00:00Z" }).to_string();
    let response = env.post_webhook(no_id).await.unwrap();
    assert_eq!(response.json(), json!({ "detail": "Empty message_id" }));

    let no_ts = json!({ "message_id": "m1", "from": "+1", "to": "+2" }).to_string();
    let response = env.post_webhook(no_ts).await.unwrap();
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(env.message_count().await.unwrap(), 0);
    assert_eq!(env.counters().webhook_count(WebhookResult::ValidationError), 5);
}

#[tokio::test]
async fn malformed_bodies_are_validation_errors_when_signed() {
    let env = TestEnv::new().await.unwrap();

    for body in ["not json", "[1, 2, 3]", r#"{"message_id": 7, "from": "+1", "to": "+2"}"#] {
        let response = env.post_webhook(body).await.unwrap();

        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
        assert!(response.json()["detail"].is_string());
    }

    assert_eq!(env.message_count().await.unwrap(), 0);
}

#[tokio::test]
async fn unsigned_invalid_body_is_unauthenticated_not_invalid() {
    let env = TestEnv::new().await.unwrap();
    let body = MessageBuilder::new().body();

    let response = env.post_webhook_with_signature(body, None).await.unwrap();

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json(), json!({ "detail": "invalid signature" }));
    assert_eq!(env.counters().webhook_count(WebhookResult::InvalidSignature), 1);
    assert_eq!(env.counters().webhook_count(WebhookResult::ValidationError), 0);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let env = TestEnv::builder()
        .limits(RequestLimits { max_payload_bytes: 64, ..RequestLimits::default() })
        .build()
        .await
        .unwrap();
    let body = MessageBuilder::with_defaults().text("x".repeat(256)).body();

    let response = env.post_webhook(body).await.unwrap();

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(env.message_count().await.unwrap(), 0);
}

#[tokio::test]
async fn every_outcome_reaches_event_subscribers() {
    let recorder = Arc::new(RecordingHandler::default());
    let env = TestEnv::builder().subscriber(recorder.clone()).build().await.unwrap();
    let body = MessageBuilder::with_defaults().message_id("m1").body();

    env.post_webhook(body.clone()).await.unwrap();
    env.post_webhook(body.clone()).await.unwrap();
    env.post_webhook_with_signature(body, Some("00")).await.unwrap();
    env.post_webhook(MessageBuilder::with_defaults().without_to().body()).await.unwrap();

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(events, [
        IngestEvent::Created { message_id: "m1".into() },
        IngestEvent::Duplicate { message_id: "m1".into() },
        IngestEvent::InvalidSignature,
        IngestEvent::ValidationFailed { reason: "Missing 'to' field".into() },
    ]);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let env = TestEnv::new().await.unwrap();

    let first = env.post_webhook(MessageBuilder::with_defaults().body()).await.unwrap();
    let second = env.get("/health/live").await.unwrap();

    let first_id = first.header("x-request-id").expect("request id on webhook response");
    let second_id = second.header("x-request-id").expect("request id on health response");
    assert_ne!(first_id, second_id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_deliveries_of_one_id_store_exactly_once() {
    let env = TestEnv::new_file_backed().await.unwrap();
    let body = MessageBuilder::with_defaults().message_id("race").body();
    let signature = env.sign(&body);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let router = env.router().clone();
        let body = body.clone();
        let signature = signature.clone();
        handles.push(tokio::spawn(async move {
            send(&router, webhook_request(body, Some(&signature))).await
        }));
    }

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json(), json!({ "status": "ok" }));
    }

    assert_eq!(env.message_count().await.unwrap(), 1);
    assert_eq!(env.counters().webhook_count(WebhookResult::Created), 1);
    assert_eq!(env.counters().webhook_count(WebhookResult::Duplicate), 15);
}
