mod common;

use axum::http::StatusCode;
use common::TestApp;
use curation_service::services::CurationStore;
use serde_json::json;

const PNG_BASE64: &str = "iVBORw0KGgo=";

#[tokio::test]
async fn inline_image_is_uploaded_under_exhibition_prefix() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;

    let (status, body) = app
        .request(
            "POST",
            &format!("/exhibitions/{}/artworks", id),
            Some(&token),
            Some(json!({
                "title": "Wave",
                "artist": "K. Hokusai",
                "image_base64": format!("data:image/png;base64,{}", PNG_BASE64),
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let url = body["image_url"].as_str().unwrap();
    let prefix = format!("{}/exhibitions/{}/", common::PUBLIC_BASE_URL, id);
    assert!(url.starts_with(&prefix), "{}", url);
    assert!(url.ends_with(".png"));
    assert_eq!(body["position"], 0);

    let (status, images) = app
        .request("GET", &format!("/exhibitions/{}/images", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(images.as_array().unwrap().len(), 1);
    assert_eq!(images[0]["size"], 8);
    assert_eq!(images[0]["url"], url);
}

#[tokio::test]
async fn artwork_needs_exactly_one_image_source() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;
    let uri = format!("/exhibitions/{}/artworks", id);

    let (neither, _) = app
        .request("POST", &uri, Some(&token), Some(json!({ "title": "Wave" })))
        .await;
    let (both, _) = app
        .request(
            "POST",
            &uri,
            Some(&token),
            Some(json!({
                "title": "Wave",
                "image_url": "https://images.example.test/wave.jpg",
                "image_base64": PNG_BASE64,
                "content_type": "image/png",
            })),
        )
        .await;

    assert_eq!(neither, StatusCode::BAD_REQUEST);
    assert_eq!(both, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn positions_default_to_append_order() {
    let app = TestApp::new();
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;
    app.add_artwork("owner", &id, "First").await;
    app.add_artwork("owner", &id, "Second").await;

    let (status, body) = app
        .request("GET", &format!("/exhibitions/{}/artworks", id), Some(&app.token("owner")), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["title"], "First");
    assert_eq!(body[0]["position"], 0);
    assert_eq!(body[1]["title"], "Second");
    assert_eq!(body[1]["position"], 1);
}

#[tokio::test]
async fn stranger_cannot_edit_artwork() {
    let app = TestApp::new();
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;
    let artwork_id = app.add_artwork("owner", &id, "Wave").await;
    let token = app.token("stranger");

    let (status, _) = app
        .request(
            "PATCH",
            &format!("/artworks/{}", artwork_id),
            Some(&token),
            Some(json!({ "title": "Taken" })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deleting_artwork_removes_its_label() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;
    let artwork_id = app.add_artwork("owner", &id, "Wave").await;
    app.request(
        "PUT",
        &format!("/exhibitions/{}/content", id),
        Some(&token),
        Some(json!({ "kind": "artwork_label", "artwork_id": artwork_id, "body": "Spray." })),
    )
    .await;
    app.request(
        "PUT",
        &format!("/exhibitions/{}/content", id),
        Some(&token),
        Some(json!({ "kind": "introduction", "body": "Welcome." })),
    )
    .await;

    let (status, _) = app
        .request("DELETE", &format!("/artworks/{}", artwork_id), Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.store.find_artwork(&artwork_id).await.unwrap().is_none());
    let content = app.store.list_content(&id).await.unwrap();
    assert_eq!(content.len(), 1);
    assert_eq!(content[0].body, "Welcome.");
}

#[tokio::test]
async fn analysis_applies_description_and_medium() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;
    let (_, artwork) = app
        .request(
            "POST",
            &format!("/exhibitions/{}/artworks", id),
            Some(&token),
            Some(json!({ "title": "Study", "image_base64": PNG_BASE64, "content_type": "image/png" })),
        )
        .await;
    let artwork_id = artwork["id"].as_str().unwrap();

    let (status, body) = app
        .request(
            "POST",
            &format!("/artworks/{}/analyze", artwork_id),
            Some(&token),
            Some(json!({ "apply": true })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["applied"], true);
    assert_eq!(body["analysis"]["medium"], "oil on canvas");
    assert_eq!(body["artwork"]["medium"], "oil on canvas");
    let stored = app.store.find_artwork(artwork_id).await.unwrap().unwrap();
    assert_eq!(
        stored.description.as_deref(),
        Some("A muted composition of overlapping planes.")
    );
}

#[tokio::test]
async fn analysis_of_external_image_is_rejected() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;
    let artwork_id = app.add_artwork("owner", &id, "Remote").await;

    let (status, _) = app
        .request("POST", &format!("/artworks/{}/analyze", artwork_id), Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analysis_rejects_malformed_body() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;
    let (_, artwork) = app
        .request(
            "POST",
            &format!("/exhibitions/{}/artworks", id),
            Some(&token),
            Some(json!({ "title": "Study", "image_base64": PNG_BASE64, "content_type": "image/png" })),
        )
        .await;
    let artwork_id = artwork["id"].as_str().unwrap();

    let (status, _) = app
        .request(
            "POST",
            &format!("/artworks/{}/analyze", artwork_id),
            Some(&token),
            Some(json!({ "apply": "yes" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let stored = app.store.find_artwork(artwork_id).await.unwrap().unwrap();
    assert!(stored.description.is_none());
}
