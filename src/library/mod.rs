//! Durable music library: artists, songs, per-user queue, favorites,
//! playlists and listening history.

mod sqlite_library_store;

pub use sqlite_library_store::SqliteLibraryStore;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::UNKNOWN_ARTIST;

pub type ArtistId = i64;
pub type SongId = i64;
pub type PlaylistId = i64;
pub type UserId = i64;

pub const DEFAULT_ALBUM_IMAGE: &str = "/static/default_album.png";

#[derive(Debug, Clone, Serialize)]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Song {
    pub id: SongId,
    pub name: String,
    pub artist_id: Option<ArtistId>,
    /// Raw artist string for songs that bypassed ingestion; the relation
    /// takes precedence when both exist.
    pub artist_name: Option<String>,
    pub album: Option<String>,
    pub audio_url: Option<String>,
    pub image_url: Option<String>,
    pub lyrics: Option<String>,
    pub is_public: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueEntry {
    pub song_id: SongId,
    pub added_at: DateTime<Utc>,
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    pub user_id: UserId,
}

/// What every playback-related endpoint returns: one track, fully resolved.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TrackDescriptor {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub lyrics: String,
    pub image_url: String,
    pub audio_url: String,
}

/// Song fields supplied directly by a client (playlist add), bypassing the
/// catalog normalizer.
#[derive(Debug, Clone)]
pub struct DirectSongFields {
    pub name: String,
    pub artist_name: Option<String>,
    pub album: Option<String>,
    pub audio_url: Option<String>,
    pub image_url: Option<String>,
}

pub trait LibraryStore: Send + Sync {
    // Artists
    fn find_artist_by_name(&self, name: &str) -> Result<Option<Artist>>;
    /// Create-if-absent; returns the id of the (possibly pre-existing) row.
    fn upsert_artist(&self, name: &str, image_url: Option<&str>) -> Result<ArtistId>;
    fn get_artist(&self, id: ArtistId) -> Result<Option<Artist>>;

    // Songs
    fn find_song(&self, name: &str, artist_id: ArtistId) -> Result<Option<Song>>;
    /// Create-if-absent keyed on (name, artist_id); existing rows are never
    /// updated in place.
    fn upsert_song(
        &self,
        name: &str,
        artist_id: ArtistId,
        album: &str,
        audio_url: &str,
        image_url: &str,
        lyrics: &str,
    ) -> Result<SongId>;
    /// Insert a song without an artist relation, from raw client fields.
    fn create_song_direct(&self, fields: &DirectSongFields) -> Result<SongId>;
    fn get_song(&self, id: SongId) -> Result<Option<Song>>;
    fn all_song_ids(&self) -> Result<Vec<SongId>>;
    fn get_track_descriptor(&self, id: SongId) -> Result<Option<TrackDescriptor>>;

    // Queue
    /// Appends unless the (user, song) pair is already queued. Returns true
    /// if a new entry was created.
    fn enqueue(&self, user_id: UserId, song_id: SongId) -> Result<bool>;
    /// Returns true if an entry was removed, false if there was none.
    fn dequeue(&self, user_id: UserId, song_id: SongId) -> Result<bool>;
    fn queue(&self, user_id: UserId) -> Result<Vec<QueueEntry>>;

    // Favorites
    fn add_favorite(&self, user_id: UserId, song_id: SongId) -> Result<bool>;
    fn remove_favorite(&self, user_id: UserId, song_id: SongId) -> Result<bool>;
    fn favorites(&self, user_id: UserId) -> Result<Vec<SongId>>;

    // Playlists
    fn create_playlist(&self, user_id: UserId, name: &str) -> Result<PlaylistId>;
    fn user_playlists(&self, user_id: UserId) -> Result<Vec<Playlist>>;
    fn get_playlist(&self, id: PlaylistId) -> Result<Option<Playlist>>;
    fn delete_playlist(&self, id: PlaylistId, user_id: UserId) -> Result<bool>;
    fn playlist_song_ids(&self, id: PlaylistId) -> Result<Vec<SongId>>;
    fn add_playlist_song(&self, id: PlaylistId, song_id: SongId) -> Result<bool>;
    fn remove_playlist_song(&self, id: PlaylistId, song_id: SongId) -> Result<bool>;

    // Listening history
    fn record_played(&self, user_id: UserId, song_id: SongId) -> Result<()>;
    fn recently_played(&self, user_id: UserId, limit: usize) -> Result<Vec<SongId>>;
}

impl Song {
    /// The display artist: relation first, then the raw denormalized field.
    /// Callers never need to know which path created the record.
    pub fn resolved_artist(&self, artist: Option<&Artist>) -> String {
        if let Some(artist) = artist {
            return artist.name.clone();
        }
        self.artist_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string())
    }
}
