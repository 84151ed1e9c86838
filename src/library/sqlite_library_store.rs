use super::*;
use crate::catalog::{LYRICS_NOT_AVAILABLE, UNKNOWN_ALBUM};
use crate::sqlite_persistence::{open_versioned, Table, VersionedSchema};
use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// V 0
const ARTIST_TABLE_V_0: Table = Table {
    name: "artist",
    schema: "CREATE TABLE artist (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE, image_url TEXT, created INTEGER DEFAULT (cast(strftime('%s','now') as int)));",
    indices: &["CREATE INDEX artist_name_index ON artist (name);"],
};
const SONG_TABLE_V_0: Table = Table {
    name: "song",
    schema: "CREATE TABLE song (id INTEGER PRIMARY KEY, name TEXT NOT NULL, artist_id INTEGER REFERENCES artist (id), artist_name TEXT, album TEXT, audio_url TEXT, image_url TEXT, lyrics TEXT, is_public INTEGER NOT NULL DEFAULT 1, created INTEGER DEFAULT (cast(strftime('%s','now') as int)), UNIQUE (name, artist_id));",
    indices: &["CREATE INDEX song_name_artist_index ON song (name, artist_id);"],
};
const QUEUE_ITEM_TABLE_V_0: Table = Table {
    name: "queue_item",
    schema: "CREATE TABLE queue_item (id INTEGER PRIMARY KEY, user_id INTEGER NOT NULL, song_id INTEGER NOT NULL REFERENCES song (id) ON DELETE CASCADE, added_at INTEGER NOT NULL DEFAULT (cast(strftime('%s','now') as int)), position INTEGER, UNIQUE (user_id, song_id));",
    indices: &["CREATE INDEX queue_item_user_index ON queue_item (user_id);"],
};
const FAVORITE_TABLE_V_0: Table = Table {
    name: "favorite",
    schema: "CREATE TABLE favorite (id INTEGER PRIMARY KEY, user_id INTEGER NOT NULL, song_id INTEGER NOT NULL REFERENCES song (id) ON DELETE CASCADE, created INTEGER DEFAULT (cast(strftime('%s','now') as int)), UNIQUE (user_id, song_id));",
    indices: &[],
};
const PLAYLIST_TABLE_V_0: Table = Table {
    name: "playlist",
    schema: "CREATE TABLE playlist (id INTEGER PRIMARY KEY, user_id INTEGER NOT NULL, name TEXT NOT NULL, created INTEGER DEFAULT (cast(strftime('%s','now') as int)));",
    indices: &[],
};
const PLAYLIST_SONG_TABLE_V_0: Table = Table {
    name: "playlist_song",
    schema: "CREATE TABLE playlist_song (playlist_id INTEGER NOT NULL REFERENCES playlist (id) ON DELETE CASCADE, song_id INTEGER NOT NULL REFERENCES song (id) ON DELETE CASCADE, UNIQUE (playlist_id, song_id));",
    indices: &[],
};
const RECENTLY_PLAYED_TABLE_V_0: Table = Table {
    name: "recently_played",
    schema: "CREATE TABLE recently_played (id INTEGER PRIMARY KEY, user_id INTEGER NOT NULL, song_id INTEGER NOT NULL REFERENCES song (id) ON DELETE CASCADE, played_at INTEGER NOT NULL DEFAULT (cast(strftime('%s','now') as int)));",
    indices: &["CREATE INDEX recently_played_user_index ON recently_played (user_id);"],
};

const LIBRARY_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ARTIST_TABLE_V_0,
        SONG_TABLE_V_0,
        QUEUE_ITEM_TABLE_V_0,
        FAVORITE_TABLE_V_0,
        PLAYLIST_TABLE_V_0,
        PLAYLIST_SONG_TABLE_V_0,
        RECENTLY_PLAYED_TABLE_V_0,
    ],
    migration: None,
}];

#[derive(Clone)]
pub struct SqliteLibraryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLibraryStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned(db_path, LIBRARY_VERSIONED_SCHEMAS)
            .context("Failed to open library database")?;
        Ok(SqliteLibraryStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_artist(row: &rusqlite::Row) -> rusqlite::Result<Artist> {
        Ok(Artist {
            id: row.get("id")?,
            name: row.get("name")?,
            image_url: row.get("image_url")?,
        })
    }

    fn row_to_song(row: &rusqlite::Row) -> rusqlite::Result<Song> {
        Ok(Song {
            id: row.get("id")?,
            name: row.get("name")?,
            artist_id: row.get("artist_id")?,
            artist_name: row.get("artist_name")?,
            album: row.get("album")?,
            audio_url: row.get("audio_url")?,
            image_url: row.get("image_url")?,
            lyrics: row.get("lyrics")?,
            is_public: row.get::<_, i64>("is_public")? != 0,
        })
    }
}

impl LibraryStore for SqliteLibraryStore {
    fn find_artist_by_name(&self, name: &str) -> Result<Option<Artist>> {
        let conn = self.conn.lock().unwrap();
        let artist = conn
            .query_row(
                "SELECT id, name, image_url FROM artist WHERE name = ?1",
                params![name],
                Self::row_to_artist,
            )
            .optional()?;
        Ok(artist)
    }

    fn upsert_artist(&self, name: &str, image_url: Option<&str>) -> Result<ArtistId> {
        let conn = self.conn.lock().unwrap();
        // A concurrent insert of the same name loses the conflict and falls
        // through to the lookup of the now-present row.
        conn.execute(
            "INSERT INTO artist (name, image_url) VALUES (?1, ?2) ON CONFLICT (name) DO NOTHING",
            params![name, image_url],
        )?;
        let id = conn.query_row(
            "SELECT id FROM artist WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn get_artist(&self, id: ArtistId) -> Result<Option<Artist>> {
        let conn = self.conn.lock().unwrap();
        let artist = conn
            .query_row(
                "SELECT id, name, image_url FROM artist WHERE id = ?1",
                params![id],
                Self::row_to_artist,
            )
            .optional()?;
        Ok(artist)
    }

    fn find_song(&self, name: &str, artist_id: ArtistId) -> Result<Option<Song>> {
        let conn = self.conn.lock().unwrap();
        let song = conn
            .query_row(
                "SELECT * FROM song WHERE name = ?1 AND artist_id = ?2",
                params![name, artist_id],
                Self::row_to_song,
            )
            .optional()?;
        Ok(song)
    }

    fn upsert_song(
        &self,
        name: &str,
        artist_id: ArtistId,
        album: &str,
        audio_url: &str,
        image_url: &str,
        lyrics: &str,
    ) -> Result<SongId> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO song (name, artist_id, album, audio_url, image_url, lyrics) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) ON CONFLICT (name, artist_id) DO NOTHING",
            params![name, artist_id, album, audio_url, image_url, lyrics],
        )?;
        let id = conn.query_row(
            "SELECT id FROM song WHERE name = ?1 AND artist_id = ?2",
            params![name, artist_id],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn create_song_direct(&self, fields: &DirectSongFields) -> Result<SongId> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO song (name, artist_name, album, audio_url, image_url) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                fields.name,
                fields.artist_name,
                fields.album,
                fields.audio_url,
                fields.image_url
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_song(&self, id: SongId) -> Result<Option<Song>> {
        let conn = self.conn.lock().unwrap();
        let song = conn
            .query_row(
                "SELECT * FROM song WHERE id = ?1",
                params![id],
                Self::row_to_song,
            )
            .optional()?;
        Ok(song)
    }

    fn all_song_ids(&self) -> Result<Vec<SongId>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id FROM song ORDER BY id ASC")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<SongId>, _>>()?;
        Ok(ids)
    }

    fn get_track_descriptor(&self, id: SongId) -> Result<Option<TrackDescriptor>> {
        let song = match self.get_song(id)? {
            Some(song) => song,
            None => return Ok(None),
        };
        let artist = match song.artist_id {
            Some(artist_id) => self.get_artist(artist_id)?,
            None => None,
        };
        Ok(Some(TrackDescriptor {
            id: song.id,
            artist: song.resolved_artist(artist.as_ref()),
            title: song.name,
            album: song.album.unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
            lyrics: song.lyrics.unwrap_or_else(|| LYRICS_NOT_AVAILABLE.to_string()),
            image_url: song
                .image_url
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_ALBUM_IMAGE.to_string()),
            audio_url: song.audio_url.unwrap_or_default(),
        }))
    }

    fn enqueue(&self, user_id: UserId, song_id: SongId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT INTO queue_item (user_id, song_id) VALUES (?1, ?2) \
             ON CONFLICT (user_id, song_id) DO NOTHING",
            params![user_id, song_id],
        )?;
        Ok(inserted > 0)
    }

    fn dequeue(&self, user_id: UserId, song_id: SongId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM queue_item WHERE user_id = ?1 AND song_id = ?2",
            params![user_id, song_id],
        )?;
        Ok(deleted > 0)
    }

    fn queue(&self, user_id: UserId) -> Result<Vec<QueueEntry>> {
        let conn = self.conn.lock().unwrap();
        // Explicit positions first, then insertion order.
        let mut stmt = conn.prepare(
            "SELECT song_id, added_at, position FROM queue_item WHERE user_id = ?1 \
             ORDER BY position IS NULL, position ASC, added_at ASC, id ASC",
        )?;
        let entries = stmt
            .query_map(params![user_id], |row| {
                Ok(QueueEntry {
                    song_id: row.get(0)?,
                    added_at: Utc
                        .timestamp_opt(row.get::<_, i64>(1)?, 0)
                        .single()
                        .unwrap_or_else(Utc::now),
                    position: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn add_favorite(&self, user_id: UserId, song_id: SongId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT INTO favorite (user_id, song_id) VALUES (?1, ?2) \
             ON CONFLICT (user_id, song_id) DO NOTHING",
            params![user_id, song_id],
        )?;
        Ok(inserted > 0)
    }

    fn remove_favorite(&self, user_id: UserId, song_id: SongId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM favorite WHERE user_id = ?1 AND song_id = ?2",
            params![user_id, song_id],
        )?;
        Ok(deleted > 0)
    }

    fn favorites(&self, user_id: UserId) -> Result<Vec<SongId>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT song_id FROM favorite WHERE user_id = ?1 ORDER BY created ASC, id ASC")?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<Result<Vec<SongId>, _>>()?;
        Ok(ids)
    }

    fn create_playlist(&self, user_id: UserId, name: &str) -> Result<PlaylistId> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO playlist (user_id, name) VALUES (?1, ?2)",
            params![user_id, name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn user_playlists(&self, user_id: UserId) -> Result<Vec<Playlist>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, user_id, name FROM playlist WHERE user_id = ?1 ORDER BY id ASC")?;
        let playlists = stmt
            .query_map(params![user_id], |row| {
                Ok(Playlist {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(playlists)
    }

    fn get_playlist(&self, id: PlaylistId) -> Result<Option<Playlist>> {
        let conn = self.conn.lock().unwrap();
        let playlist = conn
            .query_row(
                "SELECT id, user_id, name FROM playlist WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Playlist {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(playlist)
    }

    fn delete_playlist(&self, id: PlaylistId, user_id: UserId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM playlist WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }

    fn playlist_song_ids(&self, id: PlaylistId) -> Result<Vec<SongId>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT song_id FROM playlist_song WHERE playlist_id = ?1 ORDER BY rowid ASC",
        )?;
        let ids = stmt
            .query_map(params![id], |row| row.get(0))?
            .collect::<Result<Vec<SongId>, _>>()?;
        Ok(ids)
    }

    fn add_playlist_song(&self, id: PlaylistId, song_id: SongId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT INTO playlist_song (playlist_id, song_id) VALUES (?1, ?2) \
             ON CONFLICT (playlist_id, song_id) DO NOTHING",
            params![id, song_id],
        )?;
        Ok(inserted > 0)
    }

    fn remove_playlist_song(&self, id: PlaylistId, song_id: SongId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM playlist_song WHERE playlist_id = ?1 AND song_id = ?2",
            params![id, song_id],
        )?;
        Ok(deleted > 0)
    }

    fn record_played(&self, user_id: UserId, song_id: SongId) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO recently_played (user_id, song_id) VALUES (?1, ?2)",
            params![user_id, song_id],
        )?;
        Ok(())
    }

    fn recently_played(&self, user_id: UserId, limit: usize) -> Result<Vec<SongId>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT song_id FROM recently_played WHERE user_id = ?1 \
             ORDER BY played_at DESC, id DESC LIMIT ?2",
        )?;
        let ids = stmt
            .query_map(params![user_id, limit as i64], |row| row.get(0))?
            .collect::<Result<Vec<SongId>, _>>()?;
        Ok(ids)
    }
}
