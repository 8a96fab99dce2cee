mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn upsert_keeps_one_block_per_kind() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;
    let uri = format!("/exhibitions/{}/content", id);

    let (status, first) = app
        .request("PUT", &uri, Some(&token), Some(json!({ "kind": "introduction", "body": "Draft one." })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = app
        .request("PUT", &uri, Some(&token), Some(json!({ "kind": "introduction", "body": "Draft two." })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["id"], second["id"]);

    let (_, blocks) = app.request("GET", &uri, Some(&token), None).await;
    let blocks = blocks.as_array().unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0]["body"], "Draft two.");
}

#[tokio::test]
async fn edit_by_id_cannot_change_kind() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;
    let uri = format!("/exhibitions/{}/content", id);

    app.request("PUT", &uri, Some(&token), Some(json!({ "kind": "introduction", "body": "Hello." })))
        .await;
    let (_, essay) = app
        .request("PUT", &uri, Some(&token), Some(json!({ "kind": "curatorial_essay", "body": "Essay." })))
        .await;

    let (status, _) = app
        .request(
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "id": essay["id"], "kind": "introduction", "body": "Second intro." })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, edited) = app
        .request(
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "id": essay["id"], "kind": "curatorial_essay", "body": "Revised essay." })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["id"], essay["id"]);

    let (_, blocks) = app.request("GET", &uri, Some(&token), None).await;
    let intros = blocks
        .as_array()
        .unwrap()
        .iter()
        .filter(|b| b["kind"] == "introduction")
        .count();
    assert_eq!(intros, 1);
}

#[tokio::test]
async fn sections_accumulate_and_list_in_kind_order() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;
    let uri = format!("/exhibitions/{}/content", id);

    for (kind, body) in [
        ("section", "Room one."),
        ("section", "Room two."),
        ("curatorial_essay", "An essay."),
        ("introduction", "Hello."),
    ] {
        let (status, _) = app
            .request("PUT", &uri, Some(&token), Some(json!({ "kind": kind, "body": body })))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, blocks) = app.request("GET", &uri, Some(&token), None).await;
    let kinds: Vec<&str> = blocks
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["introduction", "curatorial_essay", "section", "section"]);
    assert_eq!(blocks[2]["position"], 0);
    assert_eq!(blocks[3]["position"], 1);
}

#[tokio::test]
async fn label_must_reference_an_artwork_of_the_exhibition() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;
    let other = app.create_exhibition("owner", json!({ "keywords": ["forest"] })).await;
    let foreign_artwork = app.add_artwork("owner", &other, "Pine").await;
    let uri = format!("/exhibitions/{}/content", id);

    let (missing, _) = app
        .request("PUT", &uri, Some(&token), Some(json!({ "kind": "artwork_label", "body": "Label." })))
        .await;
    let (foreign, _) = app
        .request(
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "kind": "artwork_label", "artwork_id": foreign_artwork, "body": "Label." })),
        )
        .await;

    assert_eq!(missing, StatusCode::BAD_REQUEST);
    assert_eq!(foreign, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn blank_body_fails_validation() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;

    let (status, body) = app
        .request(
            "PUT",
            &format!("/exhibitions/{}/content", id),
            Some(&token),
            Some(json!({ "kind": "introduction", "body": "" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation error");
}

#[tokio::test]
async fn delete_content_is_scoped_to_exhibition() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app.create_exhibition("owner", json!({ "keywords": ["sea"] })).await;
    let other = app.create_exhibition("owner", json!({ "keywords": ["forest"] })).await;
    let (_, block) = app
        .request(
            "PUT",
            &format!("/exhibitions/{}/content", id),
            Some(&token),
            Some(json!({ "kind": "introduction", "body": "Hello." })),
        )
        .await;
    let block_id = block["id"].as_str().unwrap();

    let (wrong, _) = app
        .request("DELETE", &format!("/exhibitions/{}/content/{}", other, block_id), Some(&token), None)
        .await;
    let (right, _) = app
        .request("DELETE", &format!("/exhibitions/{}/content/{}", id, block_id), Some(&token), None)
        .await;

    assert_eq!(wrong, StatusCode::NOT_FOUND);
    assert_eq!(right, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn gallery_places_every_artwork() {
    let app = TestApp::new();
    let token = app.token("owner");
    let id = app
        .create_exhibition("owner", json!({ "keywords": ["sea"], "title": "Tides" }))
        .await;
    for title in ["One", "Two", "Three", "Four", "Five"] {
        app.add_artwork("owner", &id, title).await;
    }

    let (status, body) = app
        .request("GET", &format!("/exhibitions/{}/gallery", id), Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Tides");
    let walls = body["walls"].as_array().unwrap();
    assert_eq!(walls.len(), 4);
    let placed: usize = walls
        .iter()
        .map(|w| w["placements"].as_array().unwrap().len())
        .sum();
    assert_eq!(placed, 5);
    assert_eq!(walls[0]["placements"][0]["title"], "One");
}
