//! Method channel: request/response dispatch by method name.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use super::stream::{EventChannel, StreamKind, Subscription};
use crate::config::AppConfig;
use crate::errors::{AppError, ErrorCode, MethodError, Result};
use crate::metadata::LyricsProvider;
use crate::search::request::DetailsMode;
use crate::search::{collect_limited, ClientKey, ClientRegistry, InnerTubeFactory, RequestNormalizer, UpstreamFactory};

pub type MethodResult = std::result::Result<Value, MethodError>;

const READY_MESSAGE: &str = "✅ All systems ready and working..";

/// Entry point a host binds its method channel and event channels to.
pub struct MusicBridge {
    config: AppConfig,
    registry: Arc<ClientRegistry>,
    normalizer: RequestNormalizer,
    lyrics: LyricsProvider,
    channels: HashMap<StreamKind, EventChannel>,
}

impl MusicBridge {
    pub fn new(config: AppConfig) -> Result<Self> {
        let factory = Arc::new(InnerTubeFactory::new(config.clone()));
        Self::with_factory(config, factory)
    }

    /// Builds a bridge whose clients come from `factory` instead of the
    /// live InnerTube endpoint.
    pub fn with_factory(config: AppConfig, factory: Arc<dyn UpstreamFactory>) -> Result<Self> {
        let registry = Arc::new(ClientRegistry::new(&config, factory));
        let lyrics = LyricsProvider::new(&config, config.proxy.as_deref())?;
        let channels = StreamKind::ALL
            .into_iter()
            .map(|kind| {
                let channel = EventChannel::new(kind, registry.clone(), config.stream_pacing());
                (kind, channel)
            })
            .collect();

        Ok(Self {
            config,
            registry,
            normalizer: RequestNormalizer::new(),
            lyrics,
            channels,
        })
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    pub fn channel(&self, kind: StreamKind) -> Option<&EventChannel> {
        self.channels.get(&kind)
    }

    /// Attaches a listener to one of the event channels.
    pub async fn listen(&self, kind: StreamKind, args: Value) -> Option<Subscription> {
        match self.channels.get(&kind) {
            Some(channel) => Some(channel.listen(args).await),
            None => None,
        }
    }

    pub async fn invoke(&self, method: &str, args: Value) -> MethodResult {
        log::debug!("Method call: {} {}", method, args);
        let outcome = match method {
            "checkStatus" => self
                .check_status()
                .await
                .map_err(|e| fail(ErrorCode::StatusError, "Failed to check status", e)),
            "initialize" => self
                .initialize(&args)
                .await
                .map_err(|e| fail(ErrorCode::InitError, "Failed to initialize", e)),
            "searchMusic" => self
                .search_music(&args)
                .await
                .map_err(|e| fail(ErrorCode::SearchError, "Search failed", e)),
            "startStreamingSearch" => self
                .start_streaming_search(&args)
                .map_err(|e| fail(ErrorCode::InvalidQuery, "Invalid query", e)),
            "getRelatedSongs" => self
                .related_songs(&args)
                .await
                .map_err(|e| fail(ErrorCode::RelatedError, "Get related songs failed", e)),
            "getArtistSongs" => self
                .artist_songs(&args)
                .await
                .map_err(|e| fail(ErrorCode::ArtistSongsError, "Failed to get artist songs", e)),
            "getSongDetails" => self
                .song_details(&args)
                .await
                .map_err(|e| fail(ErrorCode::SongDetailsError, "Failed to get song details", e)),
            "getLyrics" => self
                .lyrics(&args)
                .await
                .map_err(|e| fail(ErrorCode::LyricsError, "Failed to get lyrics", e)),
            "dispose" => self
                .dispose()
                .await
                .map_err(|e| fail(ErrorCode::DisposeError, "Failed to dispose", e)),
            other => {
                log::warn!("Unknown method: {}", other);
                Err(MethodError::not_implemented(other))
            }
        };

        if let Err(error) = &outcome {
            log::error!("❌ {} failed: {}", method, error);
        }
        outcome
    }

    async fn check_status(&self) -> Result<Value> {
        let initialized = self.registry.is_initialized().await;
        let cached_clients = self.registry.cached_clients().await;

        let (key, reachable, message) = match self.registry.active().await {
            Ok(service) => {
                let key = service.key().clone();
                match service.upstream().ping().await {
                    Ok(()) => (Some(key), true, READY_MESSAGE.to_string()),
                    Err(e) => {
                        log::warn!("⚠️ Upstream check failed: {}", e);
                        (Some(key), false, format!("Upstream unreachable: {}", e))
                    }
                }
            }
            Err(e) => (None, false, e.to_string()),
        };

        Ok(json!({
            "success": true,
            "initialized": initialized,
            "country": key.as_ref().map(|k| k.country.clone()),
            "proxy": key.and_then(|k| k.proxy),
            "cachedClients": cached_clients,
            "upstreamReachable": reachable,
            "message": message,
        }))
    }

    async fn initialize(&self, args: &Value) -> Result<Value> {
        let request = self.normalizer.initialize(args, &self.config.country)?;
        let proxy = request.proxy.or_else(|| self.config.proxy.clone());
        log::info!(
            "🔧 Initializing (proxy: {}, country: {})",
            proxy.as_deref().unwrap_or("none"),
            request.country
        );
        self.registry
            .initialize(ClientKey::new(proxy, request.country))
            .await?;
        Ok(json!({
            "success": true,
            "message": "YTMusic API initialized successfully",
        }))
    }

    async fn search_music(&self, args: &Value) -> Result<Value> {
        let request = self.normalizer.search(args)?;
        let service = self.registry.active().await?;
        let collected = collect_limited(service.search(&request), request.limit).await?;
        log::info!("✅ Search returned {} results", collected.items.len());
        Ok(json!({
            "success": true,
            "count": collected.items.len(),
            "data": collected.items,
        }))
    }

    fn start_streaming_search(&self, args: &Value) -> Result<Value> {
        let request = self.normalizer.search(args)?;
        Ok(json!({
            "started": true,
            "message": "Streaming search will start when EventChannel is listened to",
            "query": request.query,
        }))
    }

    async fn related_songs(&self, args: &Value) -> Result<Value> {
        let request = self.normalizer.related(args)?;
        let service = self.registry.active().await?;
        let collected = collect_limited(service.related(&request).await?, request.limit).await?;
        log::info!("✅ Found {} related songs", collected.items.len());
        Ok(json!({
            "success": true,
            "count": collected.items.len(),
            "data": collected.items,
        }))
    }

    async fn artist_songs(&self, args: &Value) -> Result<Value> {
        let request = self.normalizer.artist(args)?;
        let service = self.registry.active().await?;
        let collected = collect_limited(service.artist_songs(&request).await?, request.limit).await?;
        log::info!(
            "✅ Found {} songs for '{}' (skipped {})",
            collected.items.len(),
            request.artist_name,
            collected.skipped
        );
        Ok(json!({
            "success": true,
            "count": collected.items.len(),
            "skipped": collected.skipped,
            "data": collected.items,
        }))
    }

    async fn song_details(&self, args: &Value) -> Result<Value> {
        let request = self.normalizer.song_details(args)?;
        let service = self.registry.active().await?;
        let details = service.song_details(&request).await?;

        Ok(match request.mode {
            DetailsMode::Single => json!({
                "success": true,
                "data": details.into_iter().next().flatten(),
                "mode": DetailsMode::Single.as_str(),
            }),
            DetailsMode::Batch => {
                let found: Vec<_> = details.into_iter().flatten().collect();
                json!({
                    "success": true,
                    "count": found.len(),
                    "data": found,
                    "mode": DetailsMode::Batch.as_str(),
                })
            }
        })
    }

    async fn lyrics(&self, args: &Value) -> Result<Value> {
        let request = self.normalizer.lyrics(args)?;
        let response = self.lyrics.fetch_lyrics(&request).await;
        Ok(serde_json::to_value(response)?)
    }

    async fn dispose(&self) -> Result<Value> {
        for channel in self.channels.values() {
            channel.cancel().await;
        }
        self.registry.dispose().await;
        Ok(json!({
            "success": true,
            "message": "Resources disposed successfully",
        }))
    }
}

fn fail(code: ErrorCode, context: &str, error: AppError) -> MethodError {
    MethodError::from_app(code, context, &error)
}
