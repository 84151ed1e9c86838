//! Playback context and queue endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::library::{SongId, TrackDescriptor};
use crate::playback::{PlaybackContext, RepeatMode};
use crate::server::{ApiError, ServerState, Session};

pub(super) fn playback_routes() -> Router<ServerState> {
    Router::new()
        .route("/next", get(next_track))
        .route("/previous", get(previous_track))
        .route("/current", get(current_track))
        .route("/play/{song_id}", post(play_song))
        .route("/settings", post(update_settings))
}

pub(super) fn queue_routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(enqueue_song).get(get_queue))
        .route("/{song_id}", delete(dequeue_song))
}

fn descriptor_or_missing(
    state: &ServerState,
    song_id: SongId,
) -> Result<TrackDescriptor, ApiError> {
    state
        .library
        .get_track_descriptor(song_id)?
        .ok_or_else(|| ApiError::NotFound("song not found".to_string()))
}

/// A fresh context for this user: the queue when it has entries, otherwise
/// the whole library. None when there are no songs at all.
fn seed_context(
    state: &ServerState,
    session: &Session,
) -> Result<Option<PlaybackContext>, ApiError> {
    let queued: Vec<SongId> = state
        .library
        .queue(session.user_id)?
        .into_iter()
        .map(|entry| entry.song_id)
        .collect();
    let seed = if queued.is_empty() {
        state.library.all_song_ids()?
    } else {
        queued
    };
    Ok(PlaybackContext::from_seed(seed))
}

enum Direction {
    Forward,
    Backward,
}

fn step(state: &ServerState, session: &Session, direction: Direction) -> Result<Value, ApiError> {
    let context = match state.playback_contexts.get(&session.token) {
        Some(context) => Some(context),
        None => seed_context(state, session)?,
    };
    let Some(mut context) = context else {
        return Ok(json!({ "message": "nothing to play" }));
    };
    let mut rng = rand::rng();
    match direction {
        Direction::Forward => context.next(&mut rng),
        Direction::Backward => context.previous(&mut rng),
    }
    let descriptor = descriptor_or_missing(state, context.current())?;
    state.library.record_played(session.user_id, context.current())?;
    state.playback_contexts.put(&session.token, context);
    Ok(json!(descriptor))
}

async fn next_track(
    session: Session,
    State(state): State<ServerState>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(step(&state, &session, Direction::Forward)?))
}

async fn previous_track(
    session: Session,
    State(state): State<ServerState>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(step(&state, &session, Direction::Backward)?))
}

async fn current_track(
    session: Session,
    State(state): State<ServerState>,
) -> Result<Json<TrackDescriptor>, ApiError> {
    let context = state
        .playback_contexts
        .get(&session.token)
        .ok_or_else(|| ApiError::NotFound("no playback context".to_string()))?;
    let descriptor = descriptor_or_missing(&state, context.current())?;
    Ok(Json(descriptor))
}

async fn play_song(
    session: Session,
    State(state): State<ServerState>,
    Path(song_id): Path<SongId>,
) -> Result<Json<TrackDescriptor>, ApiError> {
    let descriptor = descriptor_or_missing(&state, song_id)?;
    let Some(mut context) = state
        .playback_contexts
        .get(&session.token)
        .or_else(|| PlaybackContext::from_seed(vec![song_id]))
    else {
        // from_seed only rejects an empty seed, which cannot happen here
        return Err(ApiError::Internal(anyhow::anyhow!(
            "failed to build playback context"
        )));
    };
    context.play(song_id);
    state.library.record_played(session.user_id, song_id)?;
    state.playback_contexts.put(&session.token, context);
    Ok(Json(descriptor))
}

#[derive(Deserialize)]
struct SettingsBody {
    shuffle: Option<bool>,
    repeat: Option<RepeatMode>,
}

async fn update_settings(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<SettingsBody>,
) -> Result<Json<Value>, ApiError> {
    let mut context = state
        .playback_contexts
        .get(&session.token)
        .ok_or_else(|| ApiError::NotFound("no playback context".to_string()))?;
    context.update_settings(body.shuffle, body.repeat);
    let (shuffle, repeat) = (context.shuffle, context.repeat);
    state.playback_contexts.put(&session.token, context);
    Ok(Json(json!({ "shuffle": shuffle, "repeat": repeat })))
}

#[derive(Deserialize)]
struct EnqueueBody {
    song_id: Option<SongId>,
}

async fn enqueue_song(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<EnqueueBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let song_id = body
        .song_id
        .ok_or_else(|| ApiError::Validation("song_id is required".to_string()))?;
    if state.library.get_song(song_id)?.is_none() {
        return Err(ApiError::NotFound("song not found".to_string()));
    }
    let added = state.library.enqueue(session.user_id, song_id)?;
    let message = if added {
        "song added to queue"
    } else {
        "song already in queue"
    };
    Ok((StatusCode::CREATED, Json(json!({ "message": message }))))
}

async fn get_queue(
    session: Session,
    State(state): State<ServerState>,
) -> Result<Json<Value>, ApiError> {
    let ids = state
        .library
        .queue(session.user_id)?
        .into_iter()
        .map(|entry| entry.song_id);
    let tracks = state.track_list(ids)?;
    Ok(Json(json!({ "queue": tracks })))
}

async fn dequeue_song(
    session: Session,
    State(state): State<ServerState>,
    Path(song_id): Path<SongId>,
) -> Result<Json<Value>, ApiError> {
    if !state.library.dequeue(session.user_id, song_id)? {
        return Err(ApiError::NotFound("song not found in queue".to_string()));
    }
    Ok(Json(json!({ "message": "song removed from queue" })))
}
