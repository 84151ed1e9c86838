mod common;

use common::{TestClient, TestServer};
use serde_json::json;

#[tokio::test]
async fn queue_roundtrip() {
    let server = TestServer::spawn().await;
    let a = server.seed_song("One", "X");
    let b = server.seed_song("Two", "X");

    let client = TestClient::new(&server);
    client.sign_up("alice").await;

    assert_eq!(client.enqueue(a).await.status(), 201);
    assert_eq!(client.enqueue(b).await.status(), 201);

    let response = client.get("/v1/queue").await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let titles: Vec<&str> = body["queue"]
        .as_array()
        .unwrap()
        .iter()
        .map(|track| track["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["One", "Two"]);

    let response = client.delete(&format!("/v1/queue/{}", a)).await;
    assert_eq!(response.status(), 200);
    let response = client.get("/v1/queue").await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["queue"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn enqueue_requires_a_song_id() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(&server);
    client.sign_up("alice").await;

    let response = client.post_json("/v1/queue", &json!({})).await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn enqueue_unknown_song_is_not_found() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(&server);
    client.sign_up("alice").await;

    assert_eq!(client.enqueue(999).await.status(), 404);
}

#[tokio::test]
async fn enqueue_twice_does_not_duplicate() {
    let server = TestServer::spawn().await;
    let a = server.seed_song("One", "X");

    let client = TestClient::new(&server);
    client.sign_up("alice").await;

    assert_eq!(client.enqueue(a).await.status(), 201);
    assert_eq!(client.enqueue(a).await.status(), 201);

    let response = client.get("/v1/queue").await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["queue"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn dequeue_missing_entry_is_not_found() {
    let server = TestServer::spawn().await;
    let a = server.seed_song("One", "X");

    let client = TestClient::new(&server);
    client.sign_up("alice").await;

    let response = client.delete(&format!("/v1/queue/{}", a)).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn queues_are_per_user() {
    let server = TestServer::spawn().await;
    let a = server.seed_song("One", "X");

    let alice = TestClient::new(&server);
    alice.sign_up("alice").await;
    let bob = TestClient::new(&server);
    bob.sign_up("bob").await;

    assert_eq!(alice.enqueue(a).await.status(), 201);

    let response = bob.get("/v1/queue").await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["queue"].as_array().unwrap().is_empty());
}
