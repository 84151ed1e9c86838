//! Turning canonical catalog records into durable library rows.

use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use crate::catalog::CanonicalSong;
use crate::library::{ArtistId, LibraryStore, SongId};

/// Idempotent create-if-absent persistence for catalog search hits.
///
/// Repeated ingestion of the same canonical record always resolves to the
/// same artist and song rows; the library store absorbs concurrent insert
/// races by re-reading after a conflict.
#[derive(Clone)]
pub struct IngestionCache {
    library: Arc<dyn LibraryStore>,
}

impl IngestionCache {
    pub fn new(library: Arc<dyn LibraryStore>) -> Self {
        IngestionCache { library }
    }

    /// Persists the record's artist and song (create-if-absent) and returns
    /// their ids. Rows are written before returning, so callers can reference
    /// the ids immediately.
    pub fn ingest(&self, song: &CanonicalSong) -> Result<(ArtistId, SongId)> {
        let artist_id = self.library.upsert_artist(&song.artist_name, None)?;
        let song_id = self.library.upsert_song(
            &song.title,
            artist_id,
            &song.album,
            &song.audio_url,
            &song.image_url,
            &song.lyrics,
        )?;
        debug!(
            "Ingested '{}' by '{}' as song {} (artist {})",
            song.title, song.artist_name, song_id, artist_id
        );
        Ok((artist_id, song_id))
    }
}
