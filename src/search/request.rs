//! Turns the loosely typed argument objects of channel calls into typed
//! requests. Nothing here touches the network.

use serde_json::Value;

use crate::api::{AudioQuality, QualityTier, ThumbnailQuality};
use crate::errors::{AppError, Result};
use crate::security::InputValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDefaults {
    pub limit: usize,
    pub thumb: QualityTier,
    pub audio: QualityTier,
    /// Tier used when a quality string is present but not recognised.
    pub fallback: QualityTier,
}

pub const SEARCH_DEFAULTS: EndpointDefaults = EndpointDefaults {
    limit: 10,
    thumb: QualityTier::High,
    audio: QualityTier::High,
    fallback: QualityTier::High,
};

pub const RELATED_DEFAULTS: EndpointDefaults = EndpointDefaults {
    limit: 10,
    thumb: QualityTier::High,
    audio: QualityTier::High,
    fallback: QualityTier::VeryHigh,
};

pub const ARTIST_DEFAULTS: EndpointDefaults = EndpointDefaults {
    limit: 25,
    thumb: QualityTier::VeryHigh,
    audio: QualityTier::High,
    fallback: QualityTier::High,
};

pub const DETAILS_DEFAULTS: EndpointDefaults = EndpointDefaults {
    limit: 1,
    thumb: QualityTier::VeryHigh,
    audio: QualityTier::VeryHigh,
    fallback: QualityTier::VeryHigh,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaOptions {
    pub thumb_quality: ThumbnailQuality,
    pub audio_quality: AudioQuality,
    pub include_audio_url: bool,
    pub include_album_art: bool,
}

impl MediaOptions {
    pub fn needs_player(&self) -> bool {
        self.include_audio_url || (self.include_album_art && self.thumb_quality.prefers_player_art())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub limit: usize,
    pub media: MediaOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelatedRequest {
    pub song_name: String,
    pub artist_name: String,
    pub limit: usize,
    pub include_original: bool,
    pub media: MediaOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtistRequest {
    pub artist_name: String,
    pub limit: usize,
    pub media: MediaOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongQuery {
    pub song_name: String,
    pub artist_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsMode {
    Batch,
    Single,
}

impl DetailsMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DetailsMode::Batch => "batch",
            DetailsMode::Single => "single",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SongDetailsRequest {
    pub songs: Vec<SongQuery>,
    pub mode: DetailsMode,
    pub media: MediaOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitRequest {
    pub proxy: Option<String>,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsRequest {
    pub title: String,
    pub artist: String,
    /// Track length in seconds, used to filter candidates.
    pub duration: Option<u64>,
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn bool_arg(args: &Value, key: &str, default: bool) -> bool {
    args.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn int_arg(args: &Value, key: &str) -> Result<Option<i64>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| AppError::validation(key, format!("{} must be an integer", key))),
    }
}

fn quality_arg(args: &Value, key: &str, default: QualityTier, fallback: QualityTier) -> QualityTier {
    match args.get(key) {
        None | Some(Value::Null) => default,
        Some(Value::String(value)) => QualityTier::parse_or(value, fallback),
        Some(other) => {
            log::warn!("Unknown {}: {}, using {}", key, other, fallback);
            fallback
        }
    }
}

pub struct RequestNormalizer {
    validator: InputValidator,
}

impl RequestNormalizer {
    pub fn new() -> Self {
        Self {
            validator: InputValidator::new(),
        }
    }

    pub fn media(&self, args: &Value, defaults: EndpointDefaults) -> MediaOptions {
        MediaOptions {
            thumb_quality: ThumbnailQuality(quality_arg(args, "thumbQuality", defaults.thumb, defaults.fallback)),
            audio_quality: AudioQuality(quality_arg(args, "audioQuality", defaults.audio, defaults.fallback)),
            include_audio_url: bool_arg(args, "includeAudioUrl", true),
            include_album_art: bool_arg(args, "includeAlbumArt", true),
        }
    }

    fn limit(&self, args: &Value, defaults: EndpointDefaults) -> Result<usize> {
        self.validator.validate_limit(int_arg(args, "limit")?, defaults.limit)
    }

    pub fn initialize(&self, args: &Value, default_country: &str) -> Result<InitRequest> {
        let proxy = str_arg(args, "proxy")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        if let Some(proxy) = &proxy {
            self.validator.validate_proxy_url(proxy)?;
        }
        let country = self
            .validator
            .validate_country(str_arg(args, "country").unwrap_or(default_country))?;
        Ok(InitRequest { proxy, country })
    }

    pub fn search(&self, args: &Value) -> Result<SearchRequest> {
        Ok(SearchRequest {
            query: self.validator.validate_search_query(str_arg(args, "query"))?,
            limit: self.limit(args, SEARCH_DEFAULTS)?,
            media: self.media(args, SEARCH_DEFAULTS),
        })
    }

    pub fn related(&self, args: &Value) -> Result<RelatedRequest> {
        Ok(RelatedRequest {
            song_name: self
                .validator
                .require_text("songName", str_arg(args, "songName"), "Song name")?,
            artist_name: self
                .validator
                .require_text("artistName", str_arg(args, "artistName"), "Artist name")?,
            limit: self.limit(args, RELATED_DEFAULTS)?,
            include_original: bool_arg(args, "includeOriginal", false),
            media: self.media(args, RELATED_DEFAULTS),
        })
    }

    pub fn artist(&self, args: &Value) -> Result<ArtistRequest> {
        Ok(ArtistRequest {
            artist_name: self
                .validator
                .require_text("artistName", str_arg(args, "artistName"), "Artist name")?,
            limit: self.limit(args, ARTIST_DEFAULTS)?,
            media: self.media(args, ARTIST_DEFAULTS),
        })
    }

    pub fn song_details(&self, args: &Value) -> Result<SongDetailsRequest> {
        let entries = match args.get("songs") {
            Some(Value::Array(entries)) if !entries.is_empty() => entries,
            _ => return Err(AppError::validation("songs", "Songs list is required")),
        };

        let songs = entries
            .iter()
            .map(|entry| {
                Ok(SongQuery {
                    song_name: self.validator.require_text(
                        "songs.song_name",
                        str_arg(entry, "song_name"),
                        "song_name",
                    )?,
                    artist_name: self.validator.require_text(
                        "songs.artist_name",
                        str_arg(entry, "artist_name"),
                        "artist_name",
                    )?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mode = match str_arg(args, "mode").map(|m| m.trim().to_ascii_lowercase()) {
            None => DetailsMode::Batch,
            Some(mode) if mode == "batch" => DetailsMode::Batch,
            Some(mode) if mode == "single" => DetailsMode::Single,
            Some(mode) => {
                return Err(AppError::validation(
                    "mode",
                    format!("Mode must be 'batch' or 'single', got '{}'", mode),
                ))
            }
        };

        Ok(SongDetailsRequest {
            songs,
            mode,
            media: self.media(args, DETAILS_DEFAULTS),
        })
    }

    pub fn lyrics(&self, args: &Value) -> Result<LyricsRequest> {
        Ok(LyricsRequest {
            title: self.validator.require_text("title", str_arg(args, "title"), "Title")?,
            artist: self.validator.require_text("artist", str_arg(args, "artist"), "Artist")?,
            duration: self.validator.validate_duration(int_arg(args, "duration")?)?,
        })
    }
}

impl Default for RequestNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_defaults_apply() {
        let request = RequestNormalizer::new().search(&json!({"query": "Gale Lag Ja"})).unwrap();
        assert_eq!(request.limit, 10);
        assert_eq!(request.media.thumb_quality, ThumbnailQuality(QualityTier::High));
        assert_eq!(request.media.audio_quality, AudioQuality(QualityTier::High));
        assert!(request.media.include_audio_url);
        assert!(request.media.include_album_art);
    }

    #[test]
    fn missing_query_is_a_validation_error() {
        let normalizer = RequestNormalizer::new();
        for args in [json!({}), json!({"query": ""}), json!({"query": "  "}), Value::Null] {
            let error = normalizer.search(&args).unwrap_err();
            assert_eq!(error.kind(), "validation");
        }
    }

    #[test]
    fn unknown_quality_uses_endpoint_fallback() {
        let normalizer = RequestNormalizer::new();
        let args = json!({"songName": "Clocks", "artistName": "Coldplay", "thumbQuality": "ultra", "audioQuality": "low"});
        let request = normalizer.related(&args).unwrap();
        assert_eq!(request.media.thumb_quality, ThumbnailQuality(QualityTier::VeryHigh));
        assert_eq!(request.media.audio_quality, AudioQuality(QualityTier::Low));
        assert!(!request.include_original);

        let artist = normalizer
            .artist(&json!({"artistName": "Coldplay", "audioQuality": "weird"}))
            .unwrap();
        assert_eq!(artist.limit, 25);
        assert_eq!(artist.media.thumb_quality, ThumbnailQuality(QualityTier::VeryHigh));
        assert_eq!(artist.media.audio_quality, AudioQuality(QualityTier::High));
    }

    #[test]
    fn song_details_requires_names_and_known_mode() {
        let normalizer = RequestNormalizer::new();
        assert!(normalizer.song_details(&json!({"songs": []})).is_err());
        assert!(normalizer
            .song_details(&json!({"songs": [{"song_name": "Yellow"}]}))
            .is_err());
        assert!(normalizer
            .song_details(&json!({"songs": [{"song_name": "Yellow", "artist_name": "Coldplay"}], "mode": "bulk"}))
            .is_err());

        let request = normalizer
            .song_details(&json!({"songs": [{"song_name": "Yellow", "artist_name": "Coldplay"}], "mode": "SINGLE"}))
            .unwrap();
        assert_eq!(request.mode, DetailsMode::Single);
        assert_eq!(request.media.audio_quality, AudioQuality(QualityTier::VeryHigh));
    }

    #[test]
    fn initialize_normalizes_country_and_proxy() {
        let normalizer = RequestNormalizer::new();
        let request = normalizer.initialize(&json!({"country": "in"}), "US").unwrap();
        assert_eq!(request.country, "IN");
        assert!(request.proxy.is_none());

        let request = normalizer.initialize(&Value::Null, "US").unwrap();
        assert_eq!(request.country, "US");

        assert!(normalizer.initialize(&json!({"proxy": "ftp://x"}), "US").is_err());
    }

    #[test]
    fn limit_must_be_an_integer_in_range() {
        let normalizer = RequestNormalizer::new();
        assert!(normalizer.search(&json!({"query": "q", "limit": "ten"})).is_err());
        assert!(normalizer.search(&json!({"query": "q", "limit": 0})).is_err());
        assert_eq!(normalizer.search(&json!({"query": "q", "limit": 3})).unwrap().limit, 3);
    }
}
