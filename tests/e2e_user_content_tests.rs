mod common;

use common::{TestClient, TestServer};
use serde_json::json;

#[tokio::test]
async fn favorites_roundtrip() {
    let server = TestServer::spawn().await;
    let a = server.seed_song("One", "X");

    let client = TestClient::new(&server);
    client.sign_up("alice").await;

    let response = client
        .post_json("/v1/user/favorites", &json!({ "song_id": a }))
        .await;
    assert_eq!(response.status(), 201);

    let response = client.get("/v1/user/favorites").await;
    let body: serde_json::Value = response.json().await.unwrap();
    let favorites = body["favorites"].as_array().unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0]["title"], "One");

    let response = client.delete(&format!("/v1/user/favorites/{}", a)).await;
    assert_eq!(response.status(), 200);
    let response = client.delete(&format!("/v1/user/favorites/{}", a)).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn favoriting_unknown_song_is_not_found() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(&server);
    client.sign_up("alice").await;

    let response = client
        .post_json("/v1/user/favorites", &json!({ "song_id": 999 }))
        .await;
    assert_eq!(response.status(), 404);

    let response = client.post_json("/v1/user/favorites", &json!({})).await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn playlist_roundtrip() {
    let server = TestServer::spawn().await;
    let a = server.seed_song("One", "X");

    let client = TestClient::new(&server);
    client.sign_up("alice").await;

    let response = client
        .post_json("/v1/user/playlists", &json!({ "name": "Road Trip" }))
        .await;
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    let playlist_id = body["id"].as_i64().unwrap();

    let response = client
        .post_json(
            &format!("/v1/user/playlists/{}/songs", playlist_id),
            &json!({ "song_id": a }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let response = client
        .get(&format!("/v1/user/playlists/{}", playlist_id))
        .await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Road Trip");
    assert_eq!(body["songs"].as_array().unwrap().len(), 1);

    let response = client
        .delete(&format!("/v1/user/playlists/{}/songs/{}", playlist_id, a))
        .await;
    assert_eq!(response.status(), 200);

    let response = client
        .delete(&format!("/v1/user/playlists/{}", playlist_id))
        .await;
    assert_eq!(response.status(), 200);
    let response = client
        .get(&format!("/v1/user/playlists/{}", playlist_id))
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn playlist_accepts_direct_song_fields() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(&server);
    client.sign_up("alice").await;

    let response = client
        .post_json("/v1/user/playlists", &json!({ "name": "Pasted" }))
        .await;
    let body: serde_json::Value = response.json().await.unwrap();
    let playlist_id = body["id"].as_i64().unwrap();

    let response = client
        .post_json(
            &format!("/v1/user/playlists/{}/songs", playlist_id),
            &json!({
                "name": "Obscure Demo",
                "artist": "Somebody",
                "audio_url": "http://example.com/demo.mp3",
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let response = client
        .get(&format!("/v1/user/playlists/{}", playlist_id))
        .await;
    let body: serde_json::Value = response.json().await.unwrap();
    let songs = body["songs"].as_array().unwrap();
    assert_eq!(songs[0]["title"], "Obscure Demo");
    assert_eq!(songs[0]["artist"], "Somebody");

    // Neither song_id nor name is a validation error.
    let response = client
        .post_json(
            &format!("/v1/user/playlists/{}/songs", playlist_id),
            &json!({ "album": "Nameless" }),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn playlists_are_private_to_their_owner() {
    let server = TestServer::spawn().await;

    let alice = TestClient::new(&server);
    alice.sign_up("alice").await;
    let response = alice
        .post_json("/v1/user/playlists", &json!({ "name": "Secret" }))
        .await;
    let body: serde_json::Value = response.json().await.unwrap();
    let playlist_id = body["id"].as_i64().unwrap();

    let bob = TestClient::new(&server);
    bob.sign_up("bob").await;
    let response = bob
        .get(&format!("/v1/user/playlists/{}", playlist_id))
        .await;
    assert_eq!(response.status(), 404);
    let response = bob
        .delete(&format!("/v1/user/playlists/{}", playlist_id))
        .await;
    assert_eq!(response.status(), 404);

    let response = bob.get("/v1/user/playlists").await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["playlists"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn recently_played_tracks_playback() {
    let server = TestServer::spawn().await;
    server.seed_song("First", "X");
    server.seed_song("Second", "X");
    let target = server.seed_song("Third", "X");

    let client = TestClient::new(&server);
    client.sign_up("alice").await;

    let response = client.get("/v1/user/recently-played").await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["recently_played"].as_array().unwrap().is_empty());

    client.next_track().await;
    let response = client
        .post_empty(&format!("/v1/playback/play/{}", target))
        .await;
    assert_eq!(response.status(), 200);

    let response = client.get("/v1/user/recently-played").await;
    let body: serde_json::Value = response.json().await.unwrap();
    let titles: Vec<&str> = body["recently_played"]
        .as_array()
        .unwrap()
        .iter()
        .map(|track| track["title"].as_str().unwrap())
        .collect();
    // Most recent first.
    assert_eq!(titles, vec!["Third", "Second"]);
}
