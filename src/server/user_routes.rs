//! Per-user content: favorites, playlists and listening history.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::library::{DirectSongFields, Playlist, PlaylistId, SongId, UserId};
use crate::server::{ApiError, ServerState, Session};

const RECENTLY_PLAYED_LIMIT: usize = 25;

pub(super) fn user_routes() -> Router<ServerState> {
    Router::new()
        .route("/favorites", post(add_favorite).get(get_favorites))
        .route("/favorites/{song_id}", delete(remove_favorite))
        .route("/playlists", post(create_playlist).get(get_playlists))
        .route("/playlists/{id}", get(get_playlist).delete(delete_playlist))
        .route("/playlists/{id}/songs", post(add_playlist_song))
        .route(
            "/playlists/{id}/songs/{song_id}",
            delete(remove_playlist_song),
        )
        .route("/recently-played", get(recently_played))
}

fn existing_song(state: &ServerState, song_id: SongId) -> Result<SongId, ApiError> {
    match state.library.get_song(song_id)? {
        Some(song) => Ok(song.id),
        None => Err(ApiError::NotFound("song not found".to_string())),
    }
}

/// Playlists are private: someone else's playlist is indistinguishable from
/// a missing one.
fn owned_playlist(
    state: &ServerState,
    user_id: UserId,
    id: PlaylistId,
) -> Result<Playlist, ApiError> {
    state
        .library
        .get_playlist(id)?
        .filter(|playlist| playlist.user_id == user_id)
        .ok_or_else(|| ApiError::NotFound("playlist not found".to_string()))
}

#[derive(Deserialize)]
struct SongIdBody {
    song_id: Option<SongId>,
}

async fn add_favorite(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<SongIdBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let song_id = body
        .song_id
        .ok_or_else(|| ApiError::Validation("song_id is required".to_string()))?;
    let song_id = existing_song(&state, song_id)?;
    let added = state.library.add_favorite(session.user_id, song_id)?;
    let message = if added {
        "song added to favorites"
    } else {
        "song already in favorites"
    };
    Ok((StatusCode::CREATED, Json(json!({ "message": message }))))
}

async fn get_favorites(
    session: Session,
    State(state): State<ServerState>,
) -> Result<Json<Value>, ApiError> {
    let ids = state.library.favorites(session.user_id)?;
    let tracks = state.track_list(ids)?;
    Ok(Json(json!({ "favorites": tracks })))
}

async fn remove_favorite(
    session: Session,
    State(state): State<ServerState>,
    Path(song_id): Path<SongId>,
) -> Result<Json<Value>, ApiError> {
    if !state.library.remove_favorite(session.user_id, song_id)? {
        return Err(ApiError::NotFound("song not found in favorites".to_string()));
    }
    Ok(Json(json!({ "message": "song removed from favorites" })))
}

#[derive(Deserialize)]
struct CreatePlaylistBody {
    name: Option<String>,
}

async fn create_playlist(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<CreatePlaylistBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let name = body
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::Validation("name is required".to_string()))?;
    let id = state.library.create_playlist(session.user_id, &name)?;
    info!("User {} created playlist '{}'", session.user_id, name);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "name": name })),
    ))
}

async fn get_playlists(
    session: Session,
    State(state): State<ServerState>,
) -> Result<Json<Value>, ApiError> {
    let playlists = state.library.user_playlists(session.user_id)?;
    Ok(Json(json!({ "playlists": playlists })))
}

async fn get_playlist(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<PlaylistId>,
) -> Result<Json<Value>, ApiError> {
    let playlist = owned_playlist(&state, session.user_id, id)?;
    let tracks = state.track_list(state.library.playlist_song_ids(id)?)?;
    Ok(Json(json!({
        "id": playlist.id,
        "name": playlist.name,
        "songs": tracks,
    })))
}

async fn delete_playlist(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<PlaylistId>,
) -> Result<Json<Value>, ApiError> {
    if !state.library.delete_playlist(id, session.user_id)? {
        return Err(ApiError::NotFound("playlist not found".to_string()));
    }
    Ok(Json(json!({ "message": "playlist deleted" })))
}

#[derive(Deserialize)]
struct AddPlaylistSongBody {
    song_id: Option<SongId>,
    name: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    audio_url: Option<String>,
    image_url: Option<String>,
}

async fn add_playlist_song(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<PlaylistId>,
    Json(body): Json<AddPlaylistSongBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let playlist = owned_playlist(&state, session.user_id, id)?;
    // Either an id of a known song, or enough raw fields to create one.
    let song_id = match body.song_id {
        Some(song_id) => existing_song(&state, song_id)?,
        None => {
            let name = body
                .name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .ok_or_else(|| {
                    ApiError::Validation("either song_id or name is required".to_string())
                })?;
            state.library.create_song_direct(&DirectSongFields {
                name,
                artist_name: body.artist,
                album: body.album,
                audio_url: body.audio_url,
                image_url: body.image_url,
            })?
        }
    };
    let added = state.library.add_playlist_song(playlist.id, song_id)?;
    let message = if added {
        "song added to playlist"
    } else {
        "song already in playlist"
    };
    Ok((StatusCode::CREATED, Json(json!({ "message": message }))))
}

async fn remove_playlist_song(
    session: Session,
    State(state): State<ServerState>,
    Path((id, song_id)): Path<(PlaylistId, SongId)>,
) -> Result<Json<Value>, ApiError> {
    let playlist = owned_playlist(&state, session.user_id, id)?;
    if !state.library.remove_playlist_song(playlist.id, song_id)? {
        return Err(ApiError::NotFound("song not found in playlist".to_string()));
    }
    Ok(Json(json!({ "message": "song removed from playlist" })))
}

async fn recently_played(
    session: Session,
    State(state): State<ServerState>,
) -> Result<Json<Value>, ApiError> {
    let ids = state
        .library
        .recently_played(session.user_id, RECENTLY_PLAYED_LIMIT)?;
    let tracks = state.track_list(ids)?;
    Ok(Json(json!({ "recently_played": tracks })))
}
