//! Normalization of raw catalog provider records.
//!
//! Provider search results are inconsistently shaped: the same field can be
//! a string in one response and a list or a map in the next. Each field is
//! parsed through an untagged union covering the shapes seen in the wild,
//! and every field has a defined fallback, so normalization never fails.

use serde::Deserialize;
use serde_json::Value;

use super::{LYRICS_NOT_AVAILABLE, UNKNOWN_ALBUM, UNKNOWN_ARTIST, UNKNOWN_TITLE};

/// The fully-defaulted representation of a single catalog search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSong {
    pub title: String,
    pub artist_name: String,
    pub album: String,
    pub image_url: String,
    pub audio_url: String,
    pub lyrics: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArtistField {
    Single(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
struct ImageVariant {
    url: Option<String>,
    link: Option<String>,
}

impl ImageVariant {
    fn url(&self) -> Option<&str> {
        self.url.as_deref().or(self.link.as_deref())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImageField {
    Variants(Vec<ImageVariant>),
    Bare(String),
}

#[derive(Deserialize)]
struct AudioVariant {
    url: Option<String>,
}

#[derive(Deserialize)]
struct BitrateMap {
    #[serde(rename = "320")]
    high: Option<String>,
    #[serde(rename = "128")]
    low: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AudioField {
    Variants(Vec<AudioVariant>),
    ByBitrate(BitrateMap),
}

#[derive(Deserialize)]
struct AlbumField {
    name: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn parse_title(raw: &Value) -> String {
    non_empty(
        raw.get("name")
            .and_then(Value::as_str)
            .map(|s| s.to_string()),
    )
    .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
}

fn parse_artist_name(raw: &Value) -> String {
    let field = raw
        .get("primary_artists")
        .or_else(|| raw.get("primaryArtists"))
        .cloned();
    match field.and_then(|v| serde_json::from_value::<ArtistField>(v).ok()) {
        Some(ArtistField::Single(name)) if !name.is_empty() => name,
        Some(ArtistField::Many(names)) if !names.is_empty() => names.join(", "),
        _ => UNKNOWN_ARTIST.to_string(),
    }
}

fn parse_image_url(raw: &Value) -> String {
    let field = raw.get("image").cloned();
    match field.and_then(|v| serde_json::from_value::<ImageField>(v).ok()) {
        // The last variant is assumed to be the highest resolution.
        Some(ImageField::Variants(variants)) => variants
            .iter()
            .rev()
            .find_map(|variant| variant.url())
            .unwrap_or_default()
            .to_string(),
        Some(ImageField::Bare(url)) => url,
        None => String::new(),
    }
}

fn parse_album(raw: &Value) -> String {
    let field = raw.get("album").cloned();
    field
        .and_then(|v| serde_json::from_value::<AlbumField>(v).ok())
        .and_then(|album| non_empty(album.name))
        .unwrap_or_else(|| UNKNOWN_ALBUM.to_string())
}

fn parse_audio_url(raw: &Value) -> String {
    let field = raw.get("downloadUrl").cloned();
    match field.and_then(|v| serde_json::from_value::<AudioField>(v).ok()) {
        // Variants are ordered worst to best, scan from the end.
        Some(AudioField::Variants(variants)) => variants
            .iter()
            .rev()
            .find_map(|variant| variant.url.clone())
            .unwrap_or_default(),
        Some(AudioField::ByBitrate(map)) => map.high.or(map.low).unwrap_or_default(),
        None => String::new(),
    }
}

fn parse_lyrics(raw: &Value) -> String {
    non_empty(
        raw.get("lyrics")
            .and_then(Value::as_str)
            .map(|s| s.to_string()),
    )
    .unwrap_or_else(|| LYRICS_NOT_AVAILABLE.to_string())
}

/// Best-resolution image url of any provider record, empty when there is
/// none. Artist and album records use the same image shapes as songs.
pub fn record_image_url(raw: &Value) -> String {
    parse_image_url(raw)
}

/// Turns one raw provider record into a canonical song. Total: any input,
/// including an empty object or wrong-typed fields, yields a record with
/// every field populated.
pub fn normalize(raw: &Value) -> CanonicalSong {
    CanonicalSong {
        title: parse_title(raw),
        artist_name: parse_artist_name(raw),
        album: parse_album(raw),
        image_url: parse_image_url(raw),
        audio_url: parse_audio_url(raw),
        lyrics: parse_lyrics(raw),
    }
}
