use moka::future::Cache;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::MusicService;
use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::upstream::{InnerTubeClient, MusicUpstream};

/// Configuration a client is built for. Equal keys share one client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    pub proxy: Option<String>,
    pub country: String,
}

impl ClientKey {
    pub fn new(proxy: Option<String>, country: impl Into<String>) -> Self {
        Self {
            proxy,
            country: country.into(),
        }
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.proxy.as_deref().unwrap_or("none"), self.country)
    }
}

/// Builds the upstream client for a key on a registry miss.
pub trait UpstreamFactory: Send + Sync {
    fn create(&self, key: &ClientKey) -> Result<Arc<dyn MusicUpstream>>;
}

pub struct InnerTubeFactory {
    config: AppConfig,
}

impl InnerTubeFactory {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

impl UpstreamFactory for InnerTubeFactory {
    fn create(&self, key: &ClientKey) -> Result<Arc<dyn MusicUpstream>> {
        let client = InnerTubeClient::new(&self.config, key.proxy.as_deref(), &key.country)?;
        Ok(Arc::new(client))
    }
}

/// Process-wide set of configured clients plus the one currently in use.
pub struct ClientRegistry {
    factory: Arc<dyn UpstreamFactory>,
    clients: Cache<ClientKey, Arc<MusicService>>,
    active: RwLock<Option<Arc<MusicService>>>,
    media_ttl: Duration,
}

impl ClientRegistry {
    pub fn new(config: &AppConfig, factory: Arc<dyn UpstreamFactory>) -> Self {
        Self {
            factory,
            clients: Cache::builder()
                .max_capacity(config.max_cached_clients)
                .build(),
            active: RwLock::new(None),
            media_ttl: config.media_cache_ttl(),
        }
    }

    /// Returns the client for `key`, building it at most once even when
    /// several callers race, and makes it the active one.
    pub async fn initialize(&self, key: ClientKey) -> Result<Arc<MusicService>> {
        let factory = self.factory.clone();
        let media_ttl = self.media_ttl;
        let build_key = key.clone();

        let service = self
            .clients
            .try_get_with(key.clone(), async move {
                log::info!("🔧 Creating music client for {}", build_key);
                let upstream = factory.create(&build_key)?;
                Ok::<_, AppError>(Arc::new(MusicService::new(upstream, build_key, media_ttl)))
            })
            .await
            .map_err(|e| AppError::Init(e.to_string()))?;

        *self.active.write().await = Some(service.clone());
        log::info!("✅ Music client {} is active", key);
        Ok(service)
    }

    pub async fn active(&self) -> Result<Arc<MusicService>> {
        self.active
            .read()
            .await
            .clone()
            .ok_or(AppError::NotInitialized)
    }

    pub async fn is_initialized(&self) -> bool {
        self.active.read().await.is_some()
    }

    pub async fn cached_clients(&self) -> u64 {
        self.clients.run_pending_tasks().await;
        self.clients.entry_count()
    }

    /// Drops every cached client; calls fail with `NotInitialized` until
    /// `initialize` runs again.
    pub async fn dispose(&self) {
        *self.active.write().await = None;
        self.clients.invalidate_all();
        self.clients.run_pending_tasks().await;
        log::info!("🧹 Music client registry cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{ArtistCatalog, ArtistRef, PlayerInfo, RawTrack, RecordStream};
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Silent;

    #[async_trait::async_trait]
    impl MusicUpstream for Silent {
        fn search_songs(&self, _query: &str, _max_records: usize) -> RecordStream {
            futures::stream::empty().boxed()
        }
        async fn search_artists(&self, _query: &str) -> Result<Vec<ArtistRef>> {
            Ok(Vec::new())
        }
        async fn artist_catalog(&self, _browse_id: &str) -> Result<ArtistCatalog> {
            Ok(ArtistCatalog::default())
        }
        async fn album_tracks(&self, _browse_id: &str) -> Result<Vec<RawTrack>> {
            Ok(Vec::new())
        }
        async fn watch_playlist(&self, _video_id: &str) -> Result<Vec<RawTrack>> {
            Ok(Vec::new())
        }
        async fn player(&self, video_id: &str) -> Result<PlayerInfo> {
            Err(AppError::Upstream(format!("no player for {}", video_id)))
        }
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            "silent"
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        built: AtomicUsize,
    }

    impl UpstreamFactory for CountingFactory {
        fn create(&self, _key: &ClientKey) -> Result<Arc<dyn MusicUpstream>> {
            self.built.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Silent))
        }
    }

    struct FailingFactory;

    impl UpstreamFactory for FailingFactory {
        fn create(&self, _key: &ClientKey) -> Result<Arc<dyn MusicUpstream>> {
            Err(AppError::Upstream("proxy unreachable".into()))
        }
    }

    #[tokio::test]
    async fn concurrent_initialize_builds_one_client() {
        let factory = Arc::new(CountingFactory::default());
        let registry = Arc::new(ClientRegistry::new(&AppConfig::default(), factory.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.initialize(ClientKey::new(None, "US")).await })
            })
            .collect();

        let mut services = Vec::new();
        for handle in handles {
            services.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(factory.built.load(Ordering::SeqCst), 1);
        assert!(services.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.cached_clients().await, 1);
    }

    #[tokio::test]
    async fn distinct_keys_get_distinct_clients() {
        let factory = Arc::new(CountingFactory::default());
        let registry = ClientRegistry::new(&AppConfig::default(), factory.clone());

        let us = registry.initialize(ClientKey::new(None, "US")).await.unwrap();
        let india = registry.initialize(ClientKey::new(None, "IN")).await.unwrap();

        assert!(!Arc::ptr_eq(&us, &india));
        assert_eq!(registry.active().await.unwrap().key().country, "IN");
        assert_eq!(factory.built.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn dispose_rejects_later_calls() {
        let registry = ClientRegistry::new(&AppConfig::default(), Arc::new(CountingFactory::default()));
        assert!(matches!(registry.active().await, Err(AppError::NotInitialized)));

        registry.initialize(ClientKey::new(None, "US")).await.unwrap();
        assert!(registry.is_initialized().await);

        registry.dispose().await;
        assert!(matches!(registry.active().await, Err(AppError::NotInitialized)));
        assert_eq!(registry.cached_clients().await, 0);
    }

    #[tokio::test]
    async fn factory_failures_are_init_errors() {
        let registry = ClientRegistry::new(&AppConfig::default(), Arc::new(FailingFactory));
        let error = registry.initialize(ClientKey::new(None, "US")).await.unwrap_err();
        assert!(matches!(error, AppError::Init(_)));
        assert!(!registry.is_initialized().await);
    }

    #[test]
    fn keys_render_like_cache_keys() {
        assert_eq!(ClientKey::new(None, "US").to_string(), "none_US");
        assert_eq!(
            ClientKey::new(Some("http://p:1".into()), "IN").to_string(),
            "http://p:1_IN"
        );
    }
}
