mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use common::{RecordingSender, delivery};
use messenger_webhook::webhook::{AppState, router};

const VERIFY_TOKEN: &str = "verify-me";

fn app(sender: &RecordingSender) -> Router {
    router(AppState::new(VERIFY_TOKEN, sender.clone()))
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn post_json(value: &serde_json::Value) -> Request<Body> {
    post(serde_json::to_vec(value).unwrap())
}

// ===== Verification =====

#[tokio::test]
async fn test_verification_echoes_challenge() {
    let sender = RecordingSender::default();
    let (status, body) = call(
        app(&sender),
        get("/?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=1158201444"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1158201444");
}

#[tokio::test]
async fn test_verification_empty_or_absent_challenge() {
    let sender = RecordingSender::default();

    let (status, body) = call(app(&sender), get("/?hub.verify_token=verify-me&hub.challenge=")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "");

    let (status, body) = call(app(&sender), get("/?hub.verify_token=verify-me")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "");
}

#[tokio::test]
async fn test_verification_rejects_wrong_token() {
    let sender = RecordingSender::default();

    for uri in [
        "/?hub.verify_token=nope&hub.challenge=123",
        "/?hub.verify_token=nope&hub.challenge=",
        "/?hub.verify_token=VERIFY-ME&hub.challenge=123",
        "/?hub.challenge=123",
        "/",
    ] {
        let (status, body) = call(app(&sender), get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body, "Invalid verification token", "{uri}");
    }
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn test_health() {
    let sender = RecordingSender::default();
    let (status, body) = call(app(&sender), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

// ===== Deliveries =====

#[tokio::test]
async fn test_message_is_echoed() {
    let sender = RecordingSender::default();
    let payload = delivery(json!([{"sender": {"id": "U1"}, "message": {"text": "hi"}}]));

    let (status, body) = call(app(&sender), post_json(&payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Message processed");

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient.id, "U1");
    assert_eq!(sent[0].text_body(), Some("hi"));
}

#[tokio::test]
async fn test_postback_gets_canned_reply() {
    let sender = RecordingSender::default();
    let payload = delivery(json!([{"sender": {"id": "U2"}, "postback": {"payload": "GET_CHIPS"}}]));

    let (status, _) = call(app(&sender), post_json(&payload)).await;

    assert_eq!(status, StatusCode::OK);
    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient.id, "U2");
    assert_eq!(sent[0].text_body(), Some("Ви натиснули на кнопку 'Отримати фішки'!"));
}

#[tokio::test]
async fn test_empty_bodies_are_bad_requests() {
    let sender = RecordingSender::default();

    for body in ["", "   ", "null", "{}", "[]", "not json"] {
        let (status, text) = call(app(&sender), post(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body:?}");
        assert_eq!(text, "Bad request", "{body:?}");
    }
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn test_missing_structure_is_internal_error() {
    let sender = RecordingSender::default();

    for payload in [
        json!({"object": "page"}),
        json!({"entry": []}),
        json!({"entry": "x"}),
        json!({"entry": [{"id": "PAGE"}]}),
        json!({"entry": [{"messaging": {}}]}),
        json!({"entry": [{"messaging": [{"message": {"text": "no sender"}}]}]}),
    ] {
        let (status, text) = call(app(&sender), post_json(&payload)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{payload}");
        assert_eq!(text, "Internal Server Error", "{payload}");
    }
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn test_earlier_replies_sent_before_malformed_event() {
    let sender = RecordingSender::default();
    let payload = delivery(json!([
        {"sender": {"id": "U1"}, "message": {"text": "hi"}},
        {"message": {"text": "x"}}
    ]));

    let (status, body) = call(app(&sender), post_json(&payload)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal Server Error");
    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient.id, "U1");
    assert_eq!(sent[0].text_body(), Some("hi"));
}

#[tokio::test]
async fn test_send_failure_does_not_change_response() {
    let sender = RecordingSender::failing_for(&["U1"]);
    let payload = delivery(json!([
        {"sender": {"id": "U1"}, "message": {"text": "first"}},
        {"sender": {"id": "U2"}, "message": {"text": "second"}}
    ]));

    let (status, body) = call(app(&sender), post_json(&payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Message processed");
    let recipients: Vec<_> = sender.sent().into_iter().map(|r| r.recipient.id).collect();
    assert_eq!(recipients, vec!["U1", "U2"]);
}

#[tokio::test]
async fn test_same_delivery_twice_sends_twice() {
    let sender = RecordingSender::default();
    let payload = delivery(json!([{"sender": {"id": "U1"}, "message": {"text": "again"}}]));

    call(app(&sender), post_json(&payload)).await;
    call(app(&sender), post_json(&payload)).await;

    let sent = sender.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
}
