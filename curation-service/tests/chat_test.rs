mod common;

use axum::http::StatusCode;
use common::{TestApp, build_request};
use serde_json::json;

#[tokio::test]
async fn chat_streams_tokens_then_done() {
    let app = TestApp::new();
    let token = app.token("owner");
    app.text.push_reply("Consider calling it Salt Lines.");

    let request = build_request(
        "POST",
        "/chat",
        Some(&token),
        Some(json!({
            "step": "title",
            "messages": [{ "role": "user", "content": "Help me name a show about the coast" }]
        })),
    );
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("event: token"), "{}", body);
    assert!(body.contains("Salt "));
    assert!(body.contains("event: done"));
    assert!(body.contains("\"finish_reason\":\"complete\""));
    assert!(!body.contains("event: error"));
}

#[tokio::test]
async fn chat_reports_provider_failure_as_error_event() {
    let app = TestApp::new();
    let token = app.token("owner");
    app.text.push_reply("Consider calling it Salt Lines.");
    app.text.fail_next_stream();

    let request = build_request(
        "POST",
        "/chat",
        Some(&token),
        Some(json!({
            "step": "title",
            "messages": [{ "role": "user", "content": "Help me name a show about the coast" }]
        })),
    );
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("event: token"), "{}", body);
    assert!(body.contains("event: error"), "{}", body);
    assert!(body.contains("The assistant is unavailable"));
    assert!(!body.contains("event: done"));
}

#[tokio::test]
async fn chat_forwards_history_with_curator_instruction() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app
        .create_exhibition("owner", json!({ "keywords": ["coast"], "title": "Salt Lines" }))
        .await;

    let request = build_request(
        "POST",
        "/chat",
        Some(&token),
        Some(json!({
            "exhibition_id": id,
            "step": "content",
            "messages": [
                { "role": "assistant", "content": "Welcome back." },
                { "role": "user", "content": "Draft an introduction" }
            ]
        })),
    );
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);

    let requests = app.text.requests();
    assert_eq!(requests.len(), 1);
    let sent = &requests[0];
    // Leading assistant turns are dropped.
    assert_eq!(sent.messages.len(), 1);
    assert_eq!(sent.messages[0].content, "Draft an introduction");
    let system = sent.system.as_deref().unwrap();
    assert!(system.contains("Title: Salt Lines"));
    assert!(system.contains("exhibition texts"));
}

#[tokio::test]
async fn content_step_requires_a_title() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app.create_exhibition("owner", json!({ "keywords": ["coast"] })).await;

    let request = build_request(
        "POST",
        "/chat",
        Some(&token),
        Some(json!({
            "exhibition_id": id,
            "step": "content",
            "messages": [{ "role": "user", "content": "Write the intro" }]
        })),
    );
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("needs a title"), "{}", body);
    assert!(app.text.requests().is_empty());
}

#[tokio::test]
async fn gallery_step_requires_artworks() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app
        .create_exhibition("owner", json!({ "keywords": ["coast"], "title": "Salt Lines" }))
        .await;

    let request = build_request(
        "POST",
        "/chat",
        Some(&token),
        Some(json!({
            "exhibition_id": id,
            "step": "gallery",
            "messages": [{ "role": "user", "content": "Arrange the room" }]
        })),
    );
    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_requires_authentication_and_messages() {
    let app = TestApp::new();

    let anonymous = build_request(
        "POST",
        "/chat",
        None,
        Some(json!({ "messages": [{ "role": "user", "content": "hi" }] })),
    );
    let (status, _) = app.send(anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.token("owner");
    let empty = build_request("POST", "/chat", Some(&token), Some(json!({ "messages": [] })));
    let (status, _) = app.send(empty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
