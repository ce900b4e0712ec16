#![allow(dead_code)]

use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use yt_music_bridge::config::AppConfig;
use yt_music_bridge::search::{ClientKey, UpstreamFactory};
use yt_music_bridge::upstream::{
    AlbumRef, ArtistCatalog, ArtistRef, AudioFormat, MusicUpstream, PlayerInfo, RawArtist, RawTrack, RecordStream,
    Thumbnail,
};
use yt_music_bridge::{AppError, MusicBridge, Result};

pub fn track(id: &str, title: &str, artist: &str) -> RawTrack {
    RawTrack {
        video_id: Some(id.to_string()),
        title: Some(title.to_string()),
        artists: vec![RawArtist {
            name: artist.to_string(),
            id: Some(format!("UC{}", artist.len())),
        }],
        duration: Some("3:45".to_string()),
        thumbnails: vec![Thumbnail {
            url: format!("https://lh3.googleusercontent.com/{}=w120-h120", id),
            width: 120,
            height: 120,
        }],
        ..RawTrack::default()
    }
}

/// In-memory catalog. Every video id has audio unless listed in `silent`.
/// With `stalled` set, song searches never yield a record.
#[derive(Default)]
pub struct FakeCatalog {
    pub songs: Vec<RawTrack>,
    pub radio: Vec<RawTrack>,
    pub artists: Vec<ArtistRef>,
    pub catalog: ArtistCatalog,
    pub albums: HashMap<String, Vec<RawTrack>>,
    pub silent: HashSet<String>,
    pub stalled: bool,
    pub calls: AtomicUsize,
    pub pulled: Arc<AtomicUsize>,
}

impl FakeCatalog {
    pub fn with_songs(songs: Vec<RawTrack>) -> Self {
        Self {
            songs,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl MusicUpstream for FakeCatalog {
    fn search_songs(&self, _query: &str, max_records: usize) -> RecordStream {
        self.hit();
        if self.stalled {
            return stream::pending::<Result<RawTrack>>().boxed();
        }
        let pulled = self.pulled.clone();
        let songs: Vec<RawTrack> = self.songs.iter().take(max_records).cloned().collect();
        stream::iter(songs)
            .map(move |song| {
                pulled.fetch_add(1, Ordering::SeqCst);
                Ok(song)
            })
            .boxed()
    }

    async fn search_artists(&self, _query: &str) -> Result<Vec<ArtistRef>> {
        self.hit();
        Ok(self.artists.clone())
    }

    async fn artist_catalog(&self, _browse_id: &str) -> Result<ArtistCatalog> {
        self.hit();
        Ok(self.catalog.clone())
    }

    async fn album_tracks(&self, browse_id: &str) -> Result<Vec<RawTrack>> {
        self.hit();
        self.albums
            .get(browse_id)
            .cloned()
            .ok_or_else(|| AppError::Upstream(format!("album {} not found", browse_id)))
    }

    async fn watch_playlist(&self, _video_id: &str) -> Result<Vec<RawTrack>> {
        self.hit();
        Ok(self.radio.clone())
    }

    async fn player(&self, video_id: &str) -> Result<PlayerInfo> {
        self.hit();
        let audio_formats = if self.silent.contains(video_id) {
            Vec::new()
        } else {
            vec![
                AudioFormat {
                    itag: 139,
                    url: Some(format!("https://audio.example/{}/139", video_id)),
                    mime_type: "audio/mp4".to_string(),
                    bitrate: 48_000,
                    average_bitrate: None,
                    drm: false,
                },
                AudioFormat {
                    itag: 251,
                    url: Some(format!("https://audio.example/{}/251", video_id)),
                    mime_type: "audio/webm; codecs=\"opus\"".to_string(),
                    bitrate: 160_000,
                    average_bitrate: None,
                    drm: false,
                },
            ]
        };
        Ok(PlayerInfo {
            video_id: video_id.to_string(),
            playable: true,
            audio_formats,
            ..PlayerInfo::default()
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

pub struct FakeFactory(pub Arc<FakeCatalog>);

impl UpstreamFactory for FakeFactory {
    fn create(&self, _key: &ClientKey) -> Result<Arc<dyn MusicUpstream>> {
        Ok(self.0.clone())
    }
}

pub fn album(browse_id: &str) -> AlbumRef {
    AlbumRef {
        title: browse_id.to_string(),
        browse_id: Some(browse_id.to_string()),
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        stream_pacing_ms: 50,
        ..AppConfig::default()
    }
}

pub fn bridge(catalog: Arc<FakeCatalog>) -> MusicBridge {
    MusicBridge::with_factory(test_config(), Arc::new(FakeFactory(catalog))).expect("bridge")
}

pub fn numbered_songs(count: usize) -> Vec<RawTrack> {
    (0..count)
        .map(|i| track(&format!("vid{:03}", i), &format!("Song {}", i), "Band"))
        .collect()
}
