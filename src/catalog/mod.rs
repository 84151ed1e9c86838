mod normalizer;
mod provider;

pub use normalizer::{normalize, record_image_url, CanonicalSong};
pub use provider::{CatalogClient, CatalogError, DEFAULT_BASE_URL};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
pub const LYRICS_NOT_AVAILABLE: &str = "Lyrics not available";
