//! Tarang is a small music streaming server: it searches an upstream
//! catalog provider, caches every hit into a local library, and tracks
//! per-user queues, playlists, favorites and playback state.

pub mod catalog;
pub mod ingestion;
pub mod library;
pub mod playback;
pub mod server;
pub mod sqlite_persistence;
pub mod user;
