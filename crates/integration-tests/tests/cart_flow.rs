//! Catalog and cart flows through the HTTP API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use gallery_integration_tests::TestClient;
use gallery_storefront::storage::StorageBackend;
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let mut client = TestClient::new();
    let response = client.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_catalog_and_detail() {
    let mut client = TestClient::new();

    let catalog = client.get("/api/catalog").await;
    assert_eq!(catalog.status, StatusCode::OK);
    assert_eq!(catalog.body.as_array().unwrap().len(), 6);

    let detail = client.get("/api/catalog/1").await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["id"], 1);
    assert_eq!(detail.body["priceValue"], 45_000);
    assert_eq!(detail.body["images"].as_array().unwrap().len(), 4);
    assert_eq!(detail.body["images"][0], detail.body["image"]);

    let missing = client.get("/api/catalog/99").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_adding_same_artwork_twice_merges() {
    let mut client = TestClient::new();

    let first = client.post("/api/cart/items", json!({"artworkId": 1})).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["openCart"], true);
    assert_eq!(first.body["item"]["quantity"], 1);

    let second = client.post("/api/cart/items", json!({"artworkId": 1})).await;
    let cart = &second.body["cart"];
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 2);
    assert_eq!(cart["items"][0]["priceValue"], 45_000);
    assert_eq!(cart["itemCount"], 2);
    assert_eq!(cart["total"], "90000");
    assert_eq!(cart["totalDisplay"], "90 000 ₴");

    let view = client.get("/api/cart").await;
    assert_eq!(view.body["itemCount"], 2);
    assert_eq!(view.body["items"][0]["lineTotal"], "90 000 ₴");
}

#[tokio::test]
async fn test_add_with_quantity_and_unknown_artwork() {
    let mut client = TestClient::new();

    let added = client
        .post("/api/cart/items", json!({"artworkId": 4, "quantity": 3}))
        .await;
    assert_eq!(added.body["cart"]["itemCount"], 3);

    let missing = client.post("/api/cart/items", json!({"artworkId": 42})).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert!(missing.body["error"].is_string());
}

#[tokio::test]
async fn test_quantity_updates_and_zero_removes() {
    let mut client = TestClient::new();
    client.post("/api/cart/items", json!({"artworkId": 3})).await;

    let updated = client.patch("/api/cart/items/3", json!({"quantity": 4})).await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["itemCount"], 4);

    let removed = client.patch("/api/cart/items/3", json!({"quantity": 0})).await;
    assert_eq!(removed.status, StatusCode::OK);
    assert!(removed.body["items"].as_array().unwrap().is_empty());
    assert_eq!(removed.body["total"], "0");

    let gone = client.patch("/api/cart/items/3", json!({"quantity": 1})).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_negative_quantity_removes() {
    let mut client = TestClient::new();
    client.post("/api/cart/items", json!({"artworkId": 5})).await;

    let removed = client.patch("/api/cart/items/5", json!({"quantity": -2})).await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.body["itemCount"], 0);
}

#[tokio::test]
async fn test_remove_item() {
    let mut client = TestClient::new();
    client.post("/api/cart/items", json!({"artworkId": 1})).await;
    client.post("/api/cart/items", json!({"artworkId": 2})).await;

    let remaining = client.delete("/api/cart/items/1").await;
    assert_eq!(remaining.status, StatusCode::OK);
    let items = remaining.body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], 2);

    let again = client.delete("/api/cart/items/1").await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_featured_entry_merges_with_catalog_artwork() {
    let mut client = TestClient::new();

    let featured = client.get("/api/featured").await;
    assert_eq!(featured.body.as_array().unwrap().len(), 2);
    assert_eq!(featured.body[0]["titleKey"], "artwork2");

    client.post("/api/cart/items", json!({"artworkId": 2})).await;
    let added = client.post("/api/featured/0/cart", json!({})).await;
    assert_eq!(added.status, StatusCode::OK);
    assert_eq!(added.body["openCart"], true);
    let items = added.body["cart"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 2);

    let missing = client.post("/api/featured/9/cart", json!({})).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_each_browser_has_its_own_cart() {
    let mut alice = TestClient::new();
    let mut bob = alice.new_browser();

    alice.post("/api/cart/items", json!({"artworkId": 1})).await;
    bob.post("/api/cart/items", json!({"artworkId": 6})).await;
    bob.post("/api/cart/items", json!({"artworkId": 6})).await;

    let alice_cart = alice.get("/api/cart").await;
    assert_eq!(alice_cart.body["itemCount"], 1);
    assert_eq!(alice_cart.body["items"][0]["id"], 1);

    let bob_cart = bob.get("/api/cart").await;
    assert_eq!(bob_cart.body["itemCount"], 2);
    assert_eq!(bob_cart.body["items"][0]["id"], 6);
}

#[tokio::test]
async fn test_cart_survives_server_restart() {
    let dir = tempfile::tempdir().unwrap();
    let backend = StorageBackend::Files(dir.path().to_path_buf());

    let mut browser = TestClient::with_backend(backend.clone());
    browser.post("/api/cart/items", json!({"artworkId": 1})).await;
    browser
        .post("/api/cart/items", json!({"artworkId": 3, "quantity": 2}))
        .await;
    assert_eq!(browser.get("/api/cart").await.body["itemCount"], 3);

    let restarted = TestClient::with_backend(backend);
    let mut returning = browser.revisit(&restarted);
    let cart = returning.get("/api/cart").await;
    assert_eq!(cart.status, StatusCode::OK);
    assert_eq!(cart.body["itemCount"], 3);
    assert_eq!(cart.body["items"].as_array().unwrap().len(), 2);

    let mut stranger = restarted.new_browser();
    assert_eq!(stranger.get("/api/cart").await.body["itemCount"], 0);
}
