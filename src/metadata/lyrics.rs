use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use url::Url;

use super::lrc;
use crate::api::{LyricsLine, LyricsResponse};
use crate::config::{base_url, AppConfig};
use crate::errors::{AppError, Result};
use crate::search::request::LyricsRequest;
use crate::upstream::http_pool::HttpPool;

pub const SOURCE: &str = "KuGou";
const PAGE_SIZE: &str = "8";
/// Seconds a KuGou song may differ from the requested duration.
const DURATION_TOLERANCE: u64 = 8;

#[derive(Debug, Default, Deserialize)]
struct SongSearchResponse {
    #[serde(default)]
    data: SongSearchData,
}

#[derive(Debug, Default, Deserialize)]
struct SongSearchData {
    #[serde(default)]
    info: Vec<SongInfo>,
}

#[derive(Debug, Deserialize)]
struct SongInfo {
    hash: String,
    #[serde(default)]
    duration: u64,
}

#[derive(Debug, Default, Deserialize)]
struct LyricsSearchResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    accesskey: String,
}

#[derive(Debug, Default, Deserialize)]
struct DownloadResponse {
    content: Option<String>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

/// Synced lyrics from KuGou: song search for hashes, lyrics search per
/// hash, then a keyword search as the last resort.
pub struct LyricsProvider {
    http: HttpPool,
    search_base: Url,
    lyrics_base: Url,
}

impl LyricsProvider {
    pub fn new(config: &AppConfig, proxy: Option<&str>) -> Result<Self> {
        Ok(Self {
            http: HttpPool::new(config, proxy)?,
            search_base: base_url(&config.kugou_search_base_url)?,
            lyrics_base: base_url(&config.kugou_lyrics_base_url)?,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> Result<T> {
        let response = self.http.client().get(url.clone()).query(query).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "{} returned HTTP {}",
                url.path(),
                response.status()
            )));
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn search_songs(&self, keyword: &str) -> Result<Vec<SongInfo>> {
        let url = self.search_base.join(&format!(
            "api/v3/search/song?keyword={}",
            urlencoding::encode(keyword)
        ))?;
        let response: SongSearchResponse = self
            .get_json(
                url,
                &[
                    ("version", "9108"),
                    ("plat", "0"),
                    ("pagesize", PAGE_SIZE),
                    ("showtype", "0"),
                ],
            )
            .await?;
        Ok(response.data.info)
    }

    async fn search_lyrics(&self, by: (&str, &str), duration_ms: Option<&str>) -> Result<Vec<Candidate>> {
        let url = self.lyrics_base.join("search")?;
        let mut query = vec![("ver", "1"), ("man", "yes"), ("client", "pc"), by];
        if let Some(duration_ms) = duration_ms {
            query.push(("duration", duration_ms));
        }
        let response: LyricsSearchResponse = self.get_json(url, &query).await?;
        Ok(response.candidates)
    }

    async fn download(&self, candidate: &Candidate) -> Result<Option<Vec<LyricsLine>>> {
        let url = self.lyrics_base.join("download")?;
        let response: DownloadResponse = self
            .get_json(
                url,
                &[
                    ("fmt", "lrc"),
                    ("charset", "utf8"),
                    ("client", "pc"),
                    ("ver", "1"),
                    ("id", candidate.id.as_str()),
                    ("accesskey", candidate.accesskey.as_str()),
                ],
            )
            .await?;

        let Some(content) = response.content.filter(|c| !c.is_empty()) else {
            return Ok(None);
        };
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(content.trim())
            .map_err(|e| AppError::Upstream(format!("Invalid lyrics payload: {}", e)))?;
        let text = String::from_utf8_lossy(&decoded);

        let normalized = lrc::normalize_lyrics(&text);
        if lrc::is_instrumental(&normalized) {
            log::info!("Skipping instrumental lyrics candidate {}", candidate.id);
            return Ok(None);
        }

        let lines = lrc::parse_lrc(&normalized);
        Ok((!lines.is_empty()).then_some(lines))
    }

    async fn first_candidate(&self, candidates: Vec<Candidate>) -> Result<Option<Vec<LyricsLine>>> {
        match candidates.first() {
            Some(candidate) => self.download(candidate).await,
            None => Ok(None),
        }
    }

    async fn by_song_hashes(&self, keyword: &str, duration: Option<u64>) -> Option<Vec<LyricsLine>> {
        let songs = match self.search_songs(keyword).await {
            Ok(songs) => songs,
            Err(e) => {
                log::debug!("❌ KuGou song search failed: {}", e);
                return None;
            }
        };
        log::debug!("KuGou returned {} song matches", songs.len());

        for song in songs {
            if let Some(wanted) = duration {
                if song.duration.abs_diff(wanted) > DURATION_TOLERANCE {
                    continue;
                }
            }
            let attempt = async {
                let candidates = self.search_lyrics(("hash", song.hash.as_str()), None).await?;
                self.first_candidate(candidates).await
            };
            match attempt.await {
                Ok(Some(lines)) => return Some(lines),
                Ok(None) => continue,
                Err(e) => {
                    log::debug!("❌ KuGou lyrics for hash {} failed: {}", song.hash, e);
                    continue;
                }
            }
        }
        None
    }

    async fn by_keyword(&self, keyword: &str, duration: Option<u64>) -> Option<Vec<LyricsLine>> {
        let duration_ms = duration
            .and_then(|seconds| seconds.checked_mul(1000))
            .map(|ms| ms.to_string());
        let attempt = async {
            let candidates = self
                .search_lyrics(("keyword", keyword), duration_ms.as_deref())
                .await?;
            self.first_candidate(candidates).await
        };
        match attempt.await {
            Ok(lines) => lines,
            Err(e) => {
                log::debug!("❌ KuGou keyword lyrics search failed: {}", e);
                None
            }
        }
    }

    pub async fn fetch_lyrics(&self, request: &LyricsRequest) -> LyricsResponse {
        log::info!("🎵 Searching for lyrics: {} - {}", request.artist, request.title);
        let keyword = lrc::keyword(&request.title, &request.artist);

        let found = match self.by_song_hashes(&keyword, request.duration).await {
            Some(lines) => Some(lines),
            None => self.by_keyword(&keyword, request.duration).await,
        };

        match found {
            Some(lines) => {
                log::info!("✅ Found {} lyrics lines from {}", lines.len(), SOURCE);
                LyricsResponse::found(lines, SOURCE)
            }
            None => {
                log::warn!("No lyrics found for {} by {}", request.title, request.artist);
                LyricsResponse::not_found(&request.title, &request.artist)
            }
        }
    }
}
