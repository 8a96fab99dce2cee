mod common;

use axum::http::StatusCode;
use common::TestApp;
use curation_service::services::CurationStore;
use serde_json::json;

#[tokio::test]
async fn create_requires_authentication() {
    let app = TestApp::new();

    let (status, _) = app
        .request("POST", "/exhibitions", None, Some(json!({ "keywords": ["sea"] })))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn new_exhibition_is_private_draft_with_clean_keywords() {
    let app = TestApp::new();
    let token = app.token("owner");

    let (status, body) = app
        .request(
            "POST",
            "/exhibitions",
            Some(&token),
            Some(json!({ "keywords": [" Tide ", "tide", "", "Salt"] })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "draft");
    assert_eq!(body["visibility"], "private");
    assert_eq!(body["keywords"], json!(["Tide", "Salt"]));
    assert_eq!(body["owner_id"], "owner");
}

#[tokio::test]
async fn private_exhibition_is_hidden_from_others() {
    let app = TestApp::new();
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;
    let uri = format!("/exhibitions/{}", id);

    let (anonymous, _) = app.request("GET", &uri, None, None).await;
    let stranger_token = app.token("stranger");
    let (stranger, _) = app.request("GET", &uri, Some(&stranger_token), None).await;
    let owner_token = app.token("owner");
    let (owner, body) = app.request("GET", &uri, Some(&owner_token), None).await;

    assert_eq!(anonymous, StatusCode::NOT_FOUND);
    assert_eq!(stranger, StatusCode::NOT_FOUND);
    assert_eq!(owner, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
}

#[tokio::test]
async fn only_owner_may_update() {
    let app = TestApp::new();
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;
    let uri = format!("/exhibitions/{}", id);

    let stranger_token = app.token("stranger");
    let (status, _) = app
        .request("PATCH", &uri, Some(&stranger_token), Some(json!({ "title": "Mine now" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (missing, _) = app
        .request(
            "PATCH",
            "/exhibitions/does-not-exist",
            Some(&stranger_token),
            Some(json!({ "title": "x" })),
        )
        .await;
    assert_eq!(missing, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn published_exhibition_appears_in_public_list() {
    let app = TestApp::new();
    let token = app.token("owner");
    let public_id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;
    app.create_exhibition("owner", json!({ "keywords": ["forest"] })).await;

    let (status, body) = app
        .request(
            "PATCH",
            &format!("/exhibitions/{}", public_id),
            Some(&token),
            Some(json!({ "title": "Open Water", "visibility": "public", "status": "completed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Open Water");

    let (status, list) = app
        .request("GET", "/exhibitions/public?page=0&page_size=500", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);
    assert_eq!(list["page"], 1);
    assert_eq!(list["page_size"], 50);
    assert_eq!(list["exhibitions"][0]["id"], public_id.as_str());

    let (anonymous, _) = app
        .request("GET", &format!("/exhibitions/{}", public_id), None, None)
        .await;
    assert_eq!(anonymous, StatusCode::OK);
}

#[tokio::test]
async fn out_of_range_page_returns_empty_list() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;
    app.request(
        "PATCH",
        &format!("/exhibitions/{}", id),
        Some(&token),
        Some(json!({ "title": "Open Water", "visibility": "public" })),
    )
    .await;

    let (status, list) = app
        .request(
            "GET",
            "/exhibitions/public?page=18446744073709551615&page_size=50",
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);
    assert_eq!(list["page"], 10_000);
    assert_eq!(list["exhibitions"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn my_exhibitions_lists_only_own() {
    let app = TestApp::new();
    app.create_exhibition("owner", json!({ "keywords": ["a"] })).await;
    app.create_exhibition("owner", json!({ "keywords": ["b"] })).await;
    app.create_exhibition("someone", json!({ "keywords": ["c"] })).await;

    let token = app.token("owner");
    let (status, body) = app.request("GET", "/me/exhibitions", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn delete_removes_artworks_content_and_images() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app
        .create_exhibition("owner", json!({ "keywords": ["sea"], "title": "Tides" }))
        .await;

    let (status, artwork) = app
        .request(
            "POST",
            &format!("/exhibitions/{}/artworks", id),
            Some(&token),
            Some(json!({
                "title": "Wave",
                "image_base64": "iVBORw0KGgo=",
                "content_type": "image/png",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", artwork);
    let (status, _) = app
        .request(
            "PUT",
            &format!("/exhibitions/{}/content", id),
            Some(&token),
            Some(json!({ "kind": "introduction", "body": "Welcome." })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request("DELETE", &format!("/exhibitions/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(app.store.find_exhibition(&id).await.unwrap().is_none());
    assert!(app.store.list_artworks(&id).await.unwrap().is_empty());
    assert!(app.store.list_content(&id).await.unwrap().is_empty());
    let key = artwork["image_url"]
        .as_str()
        .unwrap()
        .trim_start_matches(&format!("{}/", common::PUBLIC_BASE_URL))
        .to_string();
    assert!(!app.storage.contains(&key).await);
}

#[tokio::test]
async fn duplicate_copies_artworks_and_remaps_labels() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app
        .create_exhibition("owner", json!({ "keywords": ["sea"], "title": "Tides" }))
        .await;
    let artwork_id = app.add_artwork("owner", &id, "Harbour").await;

    let (status, _) = app
        .request(
            "PUT",
            &format!("/exhibitions/{}/content", id),
            Some(&token),
            Some(json!({ "kind": "artwork_label", "artwork_id": artwork_id, "body": "Boats at rest." })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, copy) = app
        .request("POST", &format!("/exhibitions/{}/duplicate", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(copy["title"], "Tides (copy)");
    assert_eq!(copy["visibility"], "private");

    let copy_id = copy["id"].as_str().unwrap();
    let artworks = app.store.list_artworks(copy_id).await.unwrap();
    let content = app.store.list_content(copy_id).await.unwrap();
    assert_eq!(artworks.len(), 1);
    assert_ne!(artworks[0].id, artwork_id);
    assert_eq!(content.len(), 1);
    assert_eq!(content[0].artwork_id.as_deref(), Some(artworks[0].id.as_str()));
}

#[tokio::test]
async fn duplicate_by_non_owner_is_forbidden() {
    let app = TestApp::new();
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;
    let token = app.token("stranger");

    let (status, _) = app
        .request("POST", &format!("/exhibitions/{}/duplicate", id), Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}
