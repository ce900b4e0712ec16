pub mod projector;
pub mod registry;
pub mod request;

pub use registry::{ClientKey, ClientRegistry, InnerTubeFactory, UpstreamFactory};
pub use request::RequestNormalizer;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{ArtistSong, RelatedSong, SearchResult, SongDetails};
use crate::errors::{ConversionError, Result};
use crate::upstream::{MusicUpstream, PlayerInfo, RawTrack, RecordStream};
use projector::ResolvedMedia;
use request::{ArtistRequest, MediaOptions, RelatedRequest, SearchRequest, SongDetailsRequest, SongQuery};

/// Raw records requested per wanted result; records without a usable
/// stream are dropped along the way.
const SEARCH_OVERFETCH: usize = 3;
const SEED_CANDIDATES: usize = 10;
const DETAILS_CANDIDATES: usize = 5;
const MAX_FALLBACK_ALBUMS: usize = 5;

/// Outcome of projecting one upstream record.
#[derive(Debug, Clone, PartialEq)]
pub enum Record<T> {
    Item(T),
    Skipped(ConversionError),
}

/// Lazy per-record outcomes of one endpoint call. An `Err` item is a hard
/// failure; skipped records are reported in-band.
pub type Outcomes<T> = BoxStream<'static, Result<Record<T>>>;

type Projection<T> = std::result::Result<T, ConversionError>;

#[derive(Debug, Clone, PartialEq)]
pub struct Collected<T> {
    pub items: Vec<T>,
    pub skipped: usize,
}

/// Drains `outcomes` until `limit` items were produced or the upstream is
/// exhausted. Only records actually pulled are counted as skipped.
pub async fn collect_limited<T>(mut outcomes: Outcomes<T>, limit: usize) -> Result<Collected<T>> {
    let mut collected = Collected {
        items: Vec::new(),
        skipped: 0,
    };
    while collected.items.len() < limit {
        match outcomes.next().await {
            Some(Ok(Record::Item(item))) => collected.items.push(item),
            Some(Ok(Record::Skipped(_))) => collected.skipped += 1,
            Some(Err(e)) => return Err(e),
            None => break,
        }
    }
    Ok(collected)
}

fn records(tracks: Vec<RawTrack>) -> RecordStream {
    stream::iter(tracks.into_iter().map(Ok)).boxed()
}

fn matches_song(track: &RawTrack, song_name: &str, artist_name: &str) -> bool {
    let title = track.title.as_deref().unwrap_or_default().to_lowercase();
    let artist = artist_name.to_lowercase();
    song_name
        .to_lowercase()
        .split_whitespace()
        .any(|word| title.contains(word))
        && track
            .artists
            .iter()
            .any(|a| a.name.to_lowercase().contains(&artist))
}

/// Picks the candidate whose title shares a word with `song_name` and whose
/// artists include `artist_name`, else the first usable candidate.
pub fn best_match(candidates: Vec<RawTrack>, song_name: &str, artist_name: &str) -> Option<RawTrack> {
    let usable: Vec<RawTrack> = candidates
        .into_iter()
        .filter(|t| projector::video_id(t).is_ok())
        .collect();
    let position = usable
        .iter()
        .position(|t| matches_song(t, song_name, artist_name))
        .unwrap_or(0);
    usable.into_iter().nth(position)
}

/// One configured upstream client together with its per-client caches.
#[derive(Clone)]
pub struct MusicService {
    upstream: Arc<dyn MusicUpstream>,
    key: ClientKey,
    players: Cache<String, Arc<PlayerInfo>>,
}

impl std::fmt::Debug for MusicService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MusicService")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl MusicService {
    pub fn new(upstream: Arc<dyn MusicUpstream>, key: ClientKey, media_ttl: Duration) -> Self {
        Self {
            upstream,
            key,
            players: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(media_ttl)
                .build(),
        }
    }

    pub fn key(&self) -> &ClientKey {
        &self.key
    }

    pub fn upstream(&self) -> &Arc<dyn MusicUpstream> {
        &self.upstream
    }

    async fn player_info(&self, video_id: &str) -> Projection<Arc<PlayerInfo>> {
        let upstream = self.upstream.clone();
        let id = video_id.to_string();
        self.players
            .try_get_with(video_id.to_string(), async move {
                upstream.player(&id).await.map(Arc::new)
            })
            .await
            .map_err(|e| ConversionError::Media {
                video_id: video_id.to_string(),
                message: e.to_string(),
            })
    }

    async fn resolve(&self, track: &RawTrack, media: &MediaOptions) -> Projection<ResolvedMedia> {
        let video_id = projector::video_id(track)?;
        let player = if media.needs_player() {
            Some(self.player_info(video_id).await?)
        } else {
            None
        };
        projector::resolve_media(track, player.as_deref(), media)
    }

    fn project_each<T, F>(&self, tracks: RecordStream, media: MediaOptions, project: F) -> Outcomes<T>
    where
        T: Send + 'static,
        F: Fn(&RawTrack, ResolvedMedia) -> Projection<T> + Clone + Send + Sync + 'static,
    {
        let service = self.clone();
        tracks
            .and_then(move |track| {
                let service = service.clone();
                let project = project.clone();
                async move {
                    let projected = match service.resolve(&track, &media).await {
                        Ok(resolved) => project(&track, resolved),
                        Err(e) => Err(e),
                    };
                    Ok(match projected {
                        Ok(item) => Record::Item(item),
                        Err(e) => {
                            log::warn!(
                                "⚠️ Skipping '{}': {}",
                                track.title.as_deref().unwrap_or("?"),
                                e
                            );
                            Record::Skipped(e)
                        }
                    })
                }
            })
            .boxed()
    }

    pub fn search(&self, request: &SearchRequest) -> Outcomes<SearchResult> {
        log::info!("🔍 Searching for '{}' (limit {})", request.query, request.limit);
        let raw = self
            .upstream
            .search_songs(&request.query, request.limit * SEARCH_OVERFETCH);
        self.project_each(raw, request.media, projector::to_search_result)
    }

    async fn find_song(&self, song_name: &str, artist_name: &str, candidates: usize) -> Result<Option<RawTrack>> {
        let query = format!("{} {}", song_name, artist_name);
        let found: Vec<RawTrack> = self.upstream.search_songs(&query, candidates).try_collect().await?;
        Ok(best_match(found, song_name, artist_name))
    }

    pub async fn related(&self, request: &RelatedRequest) -> Result<Outcomes<RelatedSong>> {
        log::info!(
            "🎵 Looking up songs related to '{}' by '{}'",
            request.song_name,
            request.artist_name
        );
        let Some(seed) = self
            .find_song(&request.song_name, &request.artist_name, SEED_CANDIDATES)
            .await?
        else {
            log::warn!("Could not find '{}' by '{}'", request.song_name, request.artist_name);
            return Ok(stream::empty().boxed());
        };
        let seed_id = projector::video_id(&seed)?.to_string();
        log::info!("Found seed track {}", seed_id);

        let playlist = self.upstream.watch_playlist(&seed_id).await?;
        let mut queue = Vec::with_capacity(playlist.len() + 1);
        if request.include_original {
            queue.push(seed);
        }
        queue.extend(
            playlist
                .into_iter()
                .filter(|t| t.video_id.as_deref() != Some(seed_id.as_str())),
        );

        let project = move |track: &RawTrack, media: ResolvedMedia| {
            let is_original = track.video_id.as_deref() == Some(seed_id.as_str());
            projector::to_related_song(track, media, is_original)
        };
        Ok(self.project_each(records(queue), request.media, project))
    }

    pub async fn artist_songs(&self, request: &ArtistRequest) -> Result<Outcomes<ArtistSong>> {
        let name = request.artist_name.clone();
        log::info!("🎤 Fetching songs for artist '{}'", name);

        let artists = self.upstream.search_artists(&name).await?;
        let wanted = name.to_lowercase();
        let chosen = artists
            .iter()
            .find(|a| a.name.to_lowercase() == wanted)
            .or_else(|| artists.first());
        let Some(browse_id) = chosen.and_then(|a| a.browse_id.clone()) else {
            log::warn!("No artist page found for '{}'", name);
            return Ok(stream::empty().boxed());
        };
        log::info!("Using artist {} for '{}'", browse_id, name);

        let catalog = self.upstream.artist_catalog(&browse_id).await?;
        let raw = if !catalog.songs.is_empty() {
            records(catalog.songs)
        } else {
            log::info!("🔄 No songs shelf, reading up to {} albums", MAX_FALLBACK_ALBUMS);
            let upstream = self.upstream.clone();
            let album_ids: Vec<String> = catalog
                .albums
                .into_iter()
                .filter_map(|album| album.browse_id)
                .take(MAX_FALLBACK_ALBUMS)
                .collect();
            stream::iter(album_ids)
                .then(move |album_id| {
                    let upstream = upstream.clone();
                    async move {
                        match upstream.album_tracks(&album_id).await {
                            Ok(tracks) => tracks,
                            Err(e) => {
                                log::warn!("⚠️ Could not read album {}: {}", album_id, e);
                                Vec::new()
                            }
                        }
                    }
                })
                .flat_map(records)
                .boxed()
        };

        let project = move |track: &RawTrack, media: ResolvedMedia| projector::to_artist_song(track, media, &name);
        Ok(self.project_each(raw, request.media, project))
    }

    async fn details_for(&self, query: &SongQuery, media: &MediaOptions) -> Result<Option<SongDetails>> {
        let Some(track) = self
            .find_song(&query.song_name, &query.artist_name, DETAILS_CANDIDATES)
            .await?
        else {
            log::warn!("No match for '{}' by '{}'", query.song_name, query.artist_name);
            return Ok(None);
        };

        let projected = match self.resolve(&track, media).await {
            Ok(resolved) => projector::to_song_details(&track, resolved, query),
            Err(e) => Err(e),
        };
        match projected {
            Ok(details) => Ok(Some(details)),
            Err(e) => {
                log::warn!("⚠️ Skipping details for '{}': {}", query.song_name, e);
                Ok(None)
            }
        }
    }

    /// Details for each requested song in order; unmatched songs are `None`.
    pub async fn song_details(&self, request: &SongDetailsRequest) -> Result<Vec<Option<SongDetails>>> {
        let songs = match request.mode {
            request::DetailsMode::Single => request.songs.get(..1).unwrap_or_default(),
            request::DetailsMode::Batch => request.songs.as_slice(),
        };
        log::info!(
            "Getting song details in {} mode for {} songs",
            request.mode.as_str(),
            songs.len()
        );

        let mut details = Vec::with_capacity(songs.len());
        for query in songs {
            details.push(self.details_for(query, &request.media).await?);
        }
        Ok(details)
    }
}
