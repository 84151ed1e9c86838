#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use tarang_server::catalog::CatalogClient;
use tarang_server::library::{LibraryStore, SongId, SqliteLibraryStore};
use tarang_server::server::{make_app, ServerConfig, ServerState};
use tarang_server::user::SqliteUserStore;

/// A fully wired server on an ephemeral port, with direct store handles so
/// tests can seed data without going through the catalog provider.
pub struct TestServer {
    pub base_url: String,
    pub library: Arc<SqliteLibraryStore>,
    _temp_dir: TempDir,
}

impl TestServer {
    pub async fn spawn() -> TestServer {
        let temp_dir = TempDir::new().unwrap();
        let library =
            Arc::new(SqliteLibraryStore::new(temp_dir.path().join("library.db")).unwrap());
        let user_store = Arc::new(SqliteUserStore::new(temp_dir.path().join("users.db")).unwrap());
        // Points at a closed port; catalog tests never reach the network.
        let catalog = Arc::new(CatalogClient::new("http://127.0.0.1:1".to_string(), 1));
        let state = ServerState::new(
            ServerConfig::default(),
            library.clone(),
            user_store,
            catalog,
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, make_app(state)).await.unwrap();
        });

        TestServer {
            base_url: format!("http://{}", addr),
            library,
            _temp_dir: temp_dir,
        }
    }

    pub fn seed_song(&self, title: &str, artist: &str) -> SongId {
        let artist_id = self.library.upsert_artist(artist, None).unwrap();
        self.library
            .upsert_song(
                title,
                artist_id,
                "Test Album",
                &format!("{}.mp3", title.to_lowercase().replace(' ', "_")),
                "",
                "",
            )
            .unwrap()
    }
}

pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
}

impl TestClient {
    pub fn new(server: &TestServer) -> TestClient {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap();
        TestClient {
            client,
            base_url: server.base_url.clone(),
        }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap()
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .unwrap()
    }

    pub async fn post_empty(&self, path: &str) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap()
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap()
    }

    pub async fn register(&self, username: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/v1/auth/register",
            &json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": password,
            }),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/v1/auth/login",
            &json!({ "username": username, "password": password }),
        )
        .await
    }

    pub async fn logout(&self) -> reqwest::Response {
        self.post_empty("/v1/auth/logout").await
    }

    /// Registers a fresh user and logs in, asserting both succeed.
    pub async fn sign_up(&self, username: &str) {
        let response = self.register(username, "password123").await;
        assert_eq!(response.status(), 201);
        let response = self.login(username, "password123").await;
        assert_eq!(response.status(), 201);
    }

    pub async fn next_track(&self) -> Value {
        let response = self.get("/v1/playback/next").await;
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }

    pub async fn previous_track(&self) -> Value {
        let response = self.get("/v1/playback/previous").await;
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }

    pub async fn enqueue(&self, song_id: SongId) -> reqwest::Response {
        self.post_json("/v1/queue", &json!({ "song_id": song_id }))
            .await
    }
}
