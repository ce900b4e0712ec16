//! Access to the music catalog backend.
//!
//! Everything the service layer needs from upstream goes through
//! [`MusicUpstream`]; the production implementation talks to the YouTube
//! Music InnerTube API, tests substitute an in-memory catalog.

pub mod http_pool;
pub mod innertube;
pub mod media;
pub mod responses;
pub mod runs;

pub use innertube::InnerTubeClient;

use crate::errors::Result;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Lazy sequence of upstream records. `None` marks natural exhaustion;
/// an `Err` item is a hard failure and ends the sequence.
pub type RecordStream = BoxStream<'static, Result<RawTrack>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

impl Thumbnail {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_square(&self) -> bool {
        self.width > 0 && self.height > 0 && {
            let ratio = self.width as f64 / self.height as f64;
            (1.0 - ratio).abs() < 0.1
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArtist {
    pub name: String,
    pub id: Option<String>,
}

/// One song-like record as the catalog returns it, before projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTrack {
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub artists: Vec<RawArtist>,
    pub album: Option<String>,
    pub duration: Option<String>,
    pub year: Option<String>,
    pub thumbnails: Vec<Thumbnail>,
}

impl RawTrack {
    pub fn artist_names(&self) -> Vec<&str> {
        self.artists
            .iter()
            .map(|a| a.name.trim())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtistRef {
    pub name: String,
    pub browse_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlbumRef {
    pub title: String,
    pub browse_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtistCatalog {
    pub songs: Vec<RawTrack>,
    pub albums: Vec<AlbumRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioFormat {
    pub itag: u32,
    pub url: Option<String>,
    pub mime_type: String,
    pub bitrate: u64,
    pub average_bitrate: Option<u64>,
    pub drm: bool,
}

impl AudioFormat {
    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }

    pub fn effective_bitrate(&self) -> u64 {
        self.average_bitrate.unwrap_or(self.bitrate)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerInfo {
    pub video_id: String,
    pub playable: bool,
    pub is_live: bool,
    pub title: Option<String>,
    pub author: Option<String>,
    pub length_seconds: Option<u64>,
    pub thumbnails: Vec<Thumbnail>,
    pub audio_formats: Vec<AudioFormat>,
}

#[async_trait::async_trait]
pub trait MusicUpstream: Send + Sync {
    /// Song search, paged lazily until `max_records` records were produced.
    fn search_songs(&self, query: &str, max_records: usize) -> RecordStream;

    async fn search_artists(&self, query: &str) -> Result<Vec<ArtistRef>>;

    async fn artist_catalog(&self, browse_id: &str) -> Result<ArtistCatalog>;

    async fn album_tracks(&self, browse_id: &str) -> Result<Vec<RawTrack>>;

    /// Radio queue seeded by `video_id`; usually starts with the seed itself.
    async fn watch_playlist(&self, video_id: &str) -> Result<Vec<RawTrack>>;

    async fn player(&self, video_id: &str) -> Result<PlayerInfo>;

    async fn ping(&self) -> Result<()>;

    fn name(&self) -> &str;
}
