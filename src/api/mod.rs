pub mod quality;

pub use quality::{AudioQuality, QualityTier, ThumbnailQuality};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub title: String,
    pub artists: String,
    pub video_id: String,
    pub duration: Option<String>,
    pub year: Option<String>,
    pub album_art: Option<String>,
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedSong {
    pub title: String,
    pub artists: String,
    pub video_id: String,
    pub duration: Option<String>,
    pub album_art: Option<String>,
    pub audio_url: Option<String>,
    pub is_original: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSong {
    pub title: String,
    pub artists: String,
    pub video_id: String,
    pub duration: Option<String>,
    pub album_art: Option<String>,
    pub audio_url: Option<String>,
    pub artist_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDetails {
    pub title: String,
    pub artists: String,
    pub video_id: String,
    pub duration: Option<String>,
    pub year: Option<String>,
    pub album: Option<String>,
    pub album_art: Option<String>,
    pub audio_url: Option<String>,
    pub song_name: String,
    pub artist_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsLine {
    /// Milliseconds from the start of the track.
    pub timestamp: u64,
    pub text: String,
    pub time_formatted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<Vec<LyricsLine>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_lines: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LyricsResponse {
    pub fn found(lines: Vec<LyricsLine>, source: &str) -> Self {
        Self {
            success: true,
            total_lines: Some(lines.len()),
            lyrics: Some(lines),
            source: Some(source.to_string()),
            error: None,
        }
    }

    pub fn not_found(title: &str, artist: &str) -> Self {
        Self {
            success: false,
            lyrics: None,
            source: None,
            total_lines: None,
            error: Some(format!("No lyrics found for {} by {}", title, artist)),
        }
    }
}
