use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use crate::errors::{AppError, Result};

const ENV_PREFIX: &str = "YT_MUSIC_BRIDGE";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub proxy: Option<String>,
    pub country: String,
    pub language: String,
    pub innertube_base_url: String,
    pub innertube_client_version: String,
    pub player_client_name: String,
    pub player_client_version: String,
    pub kugou_search_base_url: String,
    pub kugou_lyrics_base_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub stream_pacing_ms: u64,
    pub max_cached_clients: u64,
    pub media_cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            country: "US".to_string(),
            language: "en".to_string(),
            innertube_base_url: "https://music.youtube.com".to_string(),
            innertube_client_version: "1.20250101.01.00".to_string(),
            player_client_name: "ANDROID_VR".to_string(),
            player_client_version: "1.60.19".to_string(),
            kugou_search_base_url: "https://mobileservice.kugou.com".to_string(),
            kugou_lyrics_base_url: "https://lyrics.kugou.com".to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 15,
            stream_pacing_ms: 50,
            max_cached_clients: 16,
            media_cache_ttl_secs: 1800,
        }
    }
}

impl AppConfig {
    /// Loads defaults, then the user config file if present, then
    /// `YT_MUSIC_BRIDGE_*` environment overrides.
    pub fn load() -> Result<Self> {
        match Self::get_config_path() {
            Ok(path) => Self::load_from(Some(&path)),
            Err(e) => {
                log::warn!("Could not resolve config path ({}), using defaults", e);
                Self::load_from(None)
            }
        }
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let defaults = ::config::Config::try_from(&AppConfig::default())?;
        let mut builder = ::config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            if path.exists() {
                log::info!("Reading configuration from {:?}", path);
                builder = builder.add_source(::config::File::from(path.to_path_buf()));
            }
        }

        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = settings.try_deserialize()?;
        config.country = config.country.to_uppercase();
        Ok(config)
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            AppError::Config(::config::ConfigError::Message(
                "Could not find config directory".to_string(),
            ))
        })?;

        Ok(config_dir.join("yt-music-bridge").join("config.json"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn stream_pacing(&self) -> Duration {
        Duration::from_millis(self.stream_pacing_ms)
    }

    pub fn media_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.media_cache_ttl_secs)
    }
}

/// Parses a configured base URL so relative joins append to its path.
/// `https://host/proxy` and `https://host/proxy/` both join to
/// `https://host/proxy/<endpoint>`.
pub fn base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
