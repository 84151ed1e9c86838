use anyhow::Result;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::SystemTime;
use tower_http::services::ServeDir;
use tracing::{debug, info};

use crate::catalog::{normalize, record_image_url};
use crate::library::DEFAULT_ALBUM_IMAGE;
use crate::server::playback_routes::{playback_routes, queue_routes};
use crate::server::session::SESSION_COOKIE_NAME;
use crate::server::user_routes::user_routes;
use crate::server::{ApiError, ServerState, Session};
use crate::user::{AuthToken, AuthTokenValue, UsernamePasswordCredentials};

pub fn make_app(state: ServerState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout));

    let catalog_routes = Router::new()
        .route("/search", get(search_songs))
        .route("/search/artists", get(search_artists))
        .route("/artist/{id}", get(artist_detail))
        .route("/album/{id}", get(album_detail));

    let mut app = Router::new()
        .route("/", get(home))
        .nest("/v1/auth", auth_routes)
        .nest("/v1/catalog", catalog_routes)
        .nest("/v1/playback", playback_routes())
        .nest("/v1/queue", queue_routes())
        .nest("/v1/user", user_routes());

    if let Some(static_dir) = &state.config.static_dir_path {
        app = app.nest_service("/static", ServeDir::new(static_dir));
    }
    if state.config.log_requests {
        app = app.layer(middleware::from_fn(log_request));
    }
    app.with_state(state)
}

pub async fn run_server(state: ServerState) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, make_app(state)).await?;
    Ok(())
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let response = next.run(request).await;
    debug!("{} {} -> {}", method, uri, response.status());
    response
}

async fn home(State(state): State<ServerState>) -> Result<Json<Value>, ApiError> {
    let songs = state.library.all_song_ids()?.len();
    Ok(Json(json!({
        "status": "ok",
        "uptime_sec": state.start_time.elapsed().as_secs(),
        "songs": songs,
    })))
}

fn required_field(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("{} is required", name)))
}

#[derive(Deserialize)]
struct RegisterBody {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

async fn register(
    State(state): State<ServerState>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let username = required_field(body.username, "username")?;
    let email = required_field(body.email, "email")?;
    let password = required_field(body.password, "password")?;
    if state.user_store.get_user_id(&username).is_some() {
        return Err(ApiError::Conflict("username already taken".to_string()));
    }
    if state.user_store.email_exists(&email) {
        return Err(ApiError::Conflict("email already registered".to_string()));
    }
    let user_id = state.user_store.create_user(&username, &email)?;
    let credentials = UsernamePasswordCredentials::from_password(user_id, &password)?;
    state.user_store.set_password_credentials(&credentials)?;
    info!("Registered user '{}'", username);
    Ok((StatusCode::CREATED, Json(json!({ "message": "user created" }))))
}

#[derive(Deserialize)]
struct LoginBody {
    username: Option<String>,
    password: Option<String>,
}

async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Result<(StatusCode, CookieJar, Json<Value>), ApiError> {
    let username = required_field(body.username, "username")?;
    let password = required_field(body.password, "password")?;
    let credentials = state
        .user_store
        .get_password_credentials(&username)
        .ok_or(ApiError::InvalidCredentials)?;
    if !credentials.verify(&password)? {
        return Err(ApiError::InvalidCredentials);
    }
    let token = AuthToken {
        user_id: credentials.user_id,
        created: SystemTime::now(),
        last_used: None,
        value: AuthTokenValue::generate(),
    };
    state.user_store.add_auth_token(&token)?;
    let cookie = Cookie::build((SESSION_COOKIE_NAME, token.value.0.clone()))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::days(30))
        .build();
    Ok((
        StatusCode::CREATED,
        jar.add(cookie),
        Json(json!({ "token": token.value.0 })),
    ))
}

async fn logout(
    session: Session,
    State(state): State<ServerState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    state
        .user_store
        .delete_auth_token(&AuthTokenValue(session.token.clone()));
    state.playback_contexts.remove(&session.token);
    let removal = Cookie::build((SESSION_COOKIE_NAME, "")).path("/").build();
    Ok((jar.remove(removal), Json(json!({ "message": "logged out" }))))
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
}

fn search_query(params: SearchParams) -> Result<String, ApiError> {
    params
        .q
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::Validation("no search query provided".to_string()))
}

/// Normalizes and ingests raw provider song records, returning display
/// summaries carrying library ids.
fn ingested_song_views(state: &ServerState, records: &[Value]) -> Result<Vec<Value>, ApiError> {
    let mut views = Vec::with_capacity(records.len());
    for raw in records {
        let canonical = normalize(raw);
        let (_, song_id) = state.ingestion.ingest(&canonical)?;
        let image_url = if canonical.image_url.is_empty() {
            DEFAULT_ALBUM_IMAGE.to_string()
        } else {
            canonical.image_url
        };
        views.push(json!({
            "id": song_id,
            "title": canonical.title,
            "artist": canonical.artist_name,
            "album": canonical.album,
            "image_url": image_url,
            "audio_url": canonical.audio_url,
        }));
    }
    Ok(views)
}

async fn search_songs(
    _session: Session,
    State(state): State<ServerState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    let query = search_query(params)?;
    let results = state.catalog.search_songs(&query).await?;
    let songs = ingested_song_views(&state, &results)?;
    Ok(Json(json!({ "query": query, "songs": songs })))
}

async fn search_artists(
    _session: Session,
    State(state): State<ServerState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    let query = search_query(params)?;
    let results = state.catalog.search_artists(&query).await?;
    let artists: Vec<Value> = results
        .iter()
        .map(|raw| {
            json!({
                "id": raw.get("id").cloned().unwrap_or(Value::Null),
                "name": raw.get("name").and_then(Value::as_str).unwrap_or_default(),
                "image_url": record_image_url(raw),
            })
        })
        .collect();
    Ok(Json(json!({ "query": query, "artists": artists })))
}

fn records_at(data: &Value, keys: &[&str]) -> Vec<Value> {
    keys.iter()
        .find_map(|key| data.get(*key).and_then(Value::as_array))
        .cloned()
        .unwrap_or_default()
}

async fn artist_detail(
    _session: Session,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let data = state.catalog.get_artist(&id).await?;
    let songs = ingested_song_views(&state, &records_at(&data, &["topSongs", "songs"]))?;
    let albums: Vec<Value> = records_at(&data, &["topAlbums", "albums"])
        .iter()
        .map(|raw| {
            json!({
                "id": raw.get("id").cloned().unwrap_or(Value::Null),
                "name": raw.get("name").and_then(Value::as_str).unwrap_or_default(),
                "year": raw.get("year").cloned().unwrap_or(Value::Null),
                "image_url": record_image_url(raw),
            })
        })
        .collect();
    Ok(Json(json!({
        "id": id,
        "name": data.get("name").and_then(Value::as_str).unwrap_or_default(),
        "image_url": record_image_url(&data),
        "top_songs": songs,
        "albums": albums,
    })))
}

async fn album_detail(
    _session: Session,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let data = state.catalog.get_album(&id).await?;
    let songs = ingested_song_views(&state, &records_at(&data, &["songs"]))?;
    Ok(Json(json!({
        "id": id,
        "name": data.get("name").and_then(Value::as_str).unwrap_or_default(),
        "year": data.get("year").cloned().unwrap_or(Value::Null),
        "image_url": record_image_url(&data),
        "songs": songs,
    })))
}
