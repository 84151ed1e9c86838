use anyhow::Result;
use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;

use crate::catalog::CatalogClient;
use crate::ingestion::IngestionCache;
use crate::library::{LibraryStore, SongId, TrackDescriptor};
use crate::playback::PlaybackContextStore;
use crate::server::ServerConfig;
use crate::user::UserStore;

pub type GuardedLibraryStore = Arc<dyn LibraryStore>;
pub type GuardedUserStore = Arc<dyn UserStore>;
pub type GuardedCatalogClient = Arc<CatalogClient>;
pub type GuardedPlaybackContexts = Arc<PlaybackContextStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub library: GuardedLibraryStore,
    pub user_store: GuardedUserStore,
    pub catalog: GuardedCatalogClient,
    pub ingestion: IngestionCache,
    pub playback_contexts: GuardedPlaybackContexts,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        library: GuardedLibraryStore,
        user_store: GuardedUserStore,
        catalog: GuardedCatalogClient,
    ) -> Self {
        let ingestion = IngestionCache::new(library.clone());
        ServerState {
            config,
            start_time: Instant::now(),
            library,
            user_store,
            catalog,
            ingestion,
            playback_contexts: Arc::new(PlaybackContextStore::default()),
        }
    }

    /// Resolves ids to descriptors, silently skipping ids that no longer
    /// resolve to a song.
    pub(crate) fn track_list(
        &self,
        ids: impl IntoIterator<Item = SongId>,
    ) -> Result<Vec<TrackDescriptor>> {
        let mut tracks = Vec::new();
        for id in ids {
            if let Some(descriptor) = self.library.get_track_descriptor(id)? {
                tracks.push(descriptor);
            }
        }
        Ok(tracks)
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(state: &ServerState) -> Self {
        state.config.clone()
    }
}

impl FromRef<ServerState> for GuardedLibraryStore {
    fn from_ref(state: &ServerState) -> Self {
        state.library.clone()
    }
}

impl FromRef<ServerState> for GuardedUserStore {
    fn from_ref(state: &ServerState) -> Self {
        state.user_store.clone()
    }
}

impl FromRef<ServerState> for GuardedCatalogClient {
    fn from_ref(state: &ServerState) -> Self {
        state.catalog.clone()
    }
}

impl FromRef<ServerState> for IngestionCache {
    fn from_ref(state: &ServerState) -> Self {
        state.ingestion.clone()
    }
}

impl FromRef<ServerState> for GuardedPlaybackContexts {
    fn from_ref(state: &ServerState) -> Self {
        state.playback_contexts.clone()
    }
}
