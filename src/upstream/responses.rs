//! Typed views over the InnerTube JSON payloads.
//!
//! Only the renderer paths the client reads are modelled; every field is
//! optional or defaulted so layout drift degrades to missing data instead
//! of a decode failure.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use super::runs::{parse_song_runs, SongRuns};
use super::{AlbumRef, ArtistRef, AudioFormat, PlayerInfo, RawArtist, RawTrack, Thumbnail};

/// Decodes a list entry by entry. Entries that do not fit `T` are logged
/// and dropped.
fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                log::warn!("Skipping malformed upstream entry: {}", e);
                None
            }
        })
        .collect())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    #[serde(default)]
    pub runs: Vec<Run>,
    pub simple_text: Option<String>,
}

impl Text {
    pub fn joined(&self) -> String {
        match &self.simple_text {
            Some(text) => text.clone(),
            None => self.runs.iter().map(|r| r.text.as_str()).collect(),
        }
    }

    pub fn first(&self) -> Option<&Run> {
        self.runs.first()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    #[serde(default)]
    pub text: String,
    pub navigation_endpoint: Option<NavigationEndpoint>,
}

impl Run {
    pub fn browse_id(&self) -> Option<&str> {
        self.navigation_endpoint
            .as_ref()
            .and_then(|n| n.browse_endpoint.as_ref())
            .map(|b| b.browse_id.as_str())
    }

    pub fn video_id(&self) -> Option<&str> {
        self.navigation_endpoint
            .as_ref()
            .and_then(|n| n.watch_endpoint.as_ref())
            .and_then(|w| w.video_id.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEndpoint {
    pub browse_endpoint: Option<BrowseEndpoint>,
    pub watch_endpoint: Option<WatchEndpoint>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseEndpoint {
    #[serde(default)]
    pub browse_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchEndpoint {
    pub video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ThumbnailList {
    #[serde(default, deserialize_with = "lenient_list")]
    pub thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicThumbnail {
    pub music_thumbnail_renderer: Option<MusicThumbnailRenderer>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MusicThumbnailRenderer {
    #[serde(default)]
    pub thumbnail: ThumbnailList,
}

impl MusicThumbnail {
    fn thumbnails(&self) -> Vec<Thumbnail> {
        self.music_thumbnail_renderer
            .as_ref()
            .map(|r| r.thumbnail.thumbnails.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Continuation {
    pub next_continuation_data: Option<NextContinuationData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextContinuationData {
    pub continuation: Option<String>,
}

fn next_token(continuations: &[Continuation]) -> Option<String> {
    continuations
        .first()
        .and_then(|c| c.next_continuation_data.as_ref())
        .and_then(|d| d.continuation.clone())
        .filter(|token| !token.is_empty())
}

// ---------------------------------------------------------------------------
// List items (search results, artist shelves, album tracks)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelfItem {
    pub music_responsive_list_item_renderer: Option<ListItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    #[serde(default)]
    pub flex_columns: Vec<FlexColumn>,
    #[serde(default)]
    pub fixed_columns: Vec<FixedColumn>,
    pub playlist_item_data: Option<PlaylistItemData>,
    #[serde(default)]
    pub thumbnail: MusicThumbnail,
    pub navigation_endpoint: Option<NavigationEndpoint>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlexColumn {
    pub music_responsive_list_item_flex_column_renderer: Option<ColumnText>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedColumn {
    pub music_responsive_list_item_fixed_column_renderer: Option<ColumnText>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ColumnText {
    #[serde(default)]
    pub text: Text,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemData {
    pub video_id: Option<String>,
}

impl ListItem {
    fn column(&self, index: usize) -> Option<&Text> {
        self.flex_columns
            .get(index)
            .and_then(|c| c.music_responsive_list_item_flex_column_renderer.as_ref())
            .map(|c| &c.text)
    }

    fn video_id(&self) -> Option<String> {
        self.playlist_item_data
            .as_ref()
            .and_then(|d| d.video_id.clone())
            .or_else(|| {
                self.column(0)
                    .and_then(Text::first)
                    .and_then(Run::video_id)
                    .map(str::to_string)
            })
    }

    pub fn to_track(&self) -> RawTrack {
        let mut runs = self
            .column(1)
            .map(|text| parse_song_runs(&text.runs))
            .unwrap_or_default();

        // Later columns only ever add an album link.
        for index in 2..self.flex_columns.len() {
            if runs.album.is_some() {
                break;
            }
            if let Some(text) = self.column(index) {
                runs.album = parse_song_runs(&text.runs).album;
            }
        }

        if runs.duration.is_none() {
            runs.duration = self
                .fixed_columns
                .first()
                .and_then(|c| c.music_responsive_list_item_fixed_column_renderer.as_ref())
                .map(|c| c.text.joined())
                .filter(|d| !d.trim().is_empty());
        }

        let SongRuns { artists, album, duration, year } = runs;
        RawTrack {
            video_id: self.video_id(),
            title: self.column(0).map(Text::joined),
            artists,
            album,
            duration,
            year,
            thumbnails: self.thumbnail.thumbnails(),
        }
    }

    pub fn to_artist(&self) -> Option<ArtistRef> {
        let name = self.column(0)?.joined();
        if name.trim().is_empty() {
            return None;
        }
        let browse_id = self
            .navigation_endpoint
            .as_ref()
            .and_then(|n| n.browse_endpoint.as_ref())
            .map(|b| b.browse_id.clone());
        Some(ArtistRef { name, browse_id })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicShelf {
    #[serde(default, deserialize_with = "lenient_list")]
    pub contents: Vec<ShelfItem>,
    #[serde(default)]
    pub continuations: Vec<Continuation>,
    #[serde(default)]
    pub title: Text,
}

impl MusicShelf {
    pub fn items(&self) -> impl Iterator<Item = &ListItem> {
        self.contents
            .iter()
            .filter_map(|i| i.music_responsive_list_item_renderer.as_ref())
    }

    pub fn tracks(&self) -> Vec<RawTrack> {
        self.items().map(ListItem::to_track).collect()
    }
}

// ---------------------------------------------------------------------------
// Section lists shared by search and browse pages
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub tab_renderer: Option<TabRenderer>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TabRenderer {
    pub content: Option<TabContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabContent {
    pub section_list_renderer: Option<SectionList>,
    pub music_queue_renderer: Option<MusicQueue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SectionList {
    #[serde(default, deserialize_with = "lenient_list")]
    pub contents: Vec<Section>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub music_shelf_renderer: Option<MusicShelf>,
    pub music_carousel_shelf_renderer: Option<CarouselShelf>,
    pub music_responsive_header_renderer: Option<ResponsiveHeader>,
}

impl SectionList {
    pub fn shelves(&self) -> impl Iterator<Item = &MusicShelf> {
        self.contents
            .iter()
            .filter_map(|s| s.music_shelf_renderer.as_ref())
    }
}

fn first_section_list(tabs: &[Tab]) -> Option<&SectionList> {
    tabs.first()
        .and_then(|t| t.tab_renderer.as_ref())
        .and_then(|t| t.content.as_ref())
        .and_then(|c| c.section_list_renderer.as_ref())
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub contents: Option<SearchContents>,
    pub continuation_contents: Option<ContinuationContents>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchContents {
    pub tabbed_search_results_renderer: Option<TabbedResults>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TabbedResults {
    #[serde(default)]
    pub tabs: Vec<Tab>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationContents {
    pub music_shelf_continuation: Option<MusicShelf>,
}

/// One page of search results plus the token for the next page, if any.
#[derive(Debug, Default)]
pub struct SearchPage {
    pub items: Vec<RawTrack>,
    pub artists: Vec<ArtistRef>,
    pub continuation: Option<String>,
}

impl SearchResponse {
    fn shelf(&self) -> Option<&MusicShelf> {
        if let Some(shelf) = self
            .continuation_contents
            .as_ref()
            .and_then(|c| c.music_shelf_continuation.as_ref())
        {
            return Some(shelf);
        }
        self.contents
            .as_ref()
            .and_then(|c| c.tabbed_search_results_renderer.as_ref())
            .and_then(|t| first_section_list(&t.tabs))
            .and_then(|list| list.shelves().next())
    }

    pub fn into_page(self) -> SearchPage {
        match self.shelf() {
            Some(shelf) => SearchPage {
                items: shelf.tracks(),
                artists: shelf.items().filter_map(ListItem::to_artist).collect(),
                continuation: next_token(&shelf.continuations),
            },
            None => SearchPage::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Browse: artist and album pages
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseResponse {
    pub contents: Option<BrowseContents>,
    pub header: Option<BrowseHeader>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseContents {
    pub single_column_browse_results_renderer: Option<TabbedResults>,
    pub two_column_browse_results_renderer: Option<TwoColumnResults>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoColumnResults {
    #[serde(default)]
    pub tabs: Vec<Tab>,
    pub secondary_contents: Option<SecondaryContents>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryContents {
    pub section_list_renderer: Option<SectionList>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseHeader {
    pub music_detail_header_renderer: Option<ResponsiveHeader>,
    pub music_immersive_header_renderer: Option<ResponsiveHeader>,
    pub music_visual_header_renderer: Option<ResponsiveHeader>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsiveHeader {
    #[serde(default)]
    pub title: Text,
    #[serde(default)]
    pub strapline_text_one: Text,
    #[serde(default)]
    pub subtitle: Text,
    #[serde(default)]
    pub thumbnail: MusicThumbnail,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselShelf {
    #[serde(default)]
    pub header: Option<CarouselHeader>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub contents: Vec<CarouselItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselHeader {
    pub music_carousel_shelf_basic_header_renderer: Option<CarouselBasicHeader>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CarouselBasicHeader {
    #[serde(default)]
    pub title: Text,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselItem {
    pub music_two_row_item_renderer: Option<TwoRowItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoRowItem {
    #[serde(default)]
    pub title: Text,
    pub navigation_endpoint: Option<NavigationEndpoint>,
}

impl TwoRowItem {
    fn album_ref(&self) -> Option<AlbumRef> {
        let browse_id = self
            .navigation_endpoint
            .as_ref()
            .and_then(|n| n.browse_endpoint.as_ref())
            .map(|b| b.browse_id.clone())
            .or_else(|| self.title.first().and_then(Run::browse_id).map(str::to_string))?;
        if !browse_id.starts_with("MPRE") {
            return None;
        }
        Some(AlbumRef {
            title: self.title.joined(),
            browse_id: Some(browse_id),
        })
    }
}

impl BrowseResponse {
    fn section_lists(&self) -> Vec<&SectionList> {
        let Some(contents) = &self.contents else {
            return Vec::new();
        };
        let mut lists = Vec::new();
        if let Some(list) = contents
            .single_column_browse_results_renderer
            .as_ref()
            .and_then(|r| first_section_list(&r.tabs))
        {
            lists.push(list);
        }
        if let Some(two) = &contents.two_column_browse_results_renderer {
            if let Some(list) = first_section_list(&two.tabs) {
                lists.push(list);
            }
            if let Some(list) = two
                .secondary_contents
                .as_ref()
                .and_then(|s| s.section_list_renderer.as_ref())
            {
                lists.push(list);
            }
        }
        lists
    }

    fn header(&self) -> Option<&ResponsiveHeader> {
        let from_sections = self
            .section_lists()
            .into_iter()
            .flat_map(|list| list.contents.iter())
            .find_map(|s| s.music_responsive_header_renderer.as_ref());
        from_sections.or_else(|| {
            self.header.as_ref().and_then(|h| {
                h.music_detail_header_renderer
                    .as_ref()
                    .or(h.music_immersive_header_renderer.as_ref())
                    .or(h.music_visual_header_renderer.as_ref())
            })
        })
    }

    /// Songs shelf and album carousel of an artist page.
    pub fn artist_sections(&self) -> (Vec<RawTrack>, Vec<AlbumRef>) {
        let lists = self.section_lists();
        let songs = lists
            .iter()
            .copied()
            .flat_map(SectionList::shelves)
            .next()
            .map(MusicShelf::tracks)
            .unwrap_or_default();

        let albums = lists
            .iter()
            .copied()
            .flat_map(|list| list.contents.iter())
            .filter_map(|s| s.music_carousel_shelf_renderer.as_ref())
            .filter(|carousel| {
                carousel
                    .header
                    .as_ref()
                    .and_then(|h| h.music_carousel_shelf_basic_header_renderer.as_ref())
                    .map(|h| {
                        let title = h.title.joined().to_lowercase();
                        title.contains("album") || title.contains("single")
                    })
                    .unwrap_or(false)
            })
            .flat_map(|carousel| carousel.contents.iter())
            .filter_map(|item| item.music_two_row_item_renderer.as_ref())
            .filter_map(TwoRowItem::album_ref)
            .collect();

        (songs, albums)
    }

    /// Tracks of an album page, with the album header filling in what the
    /// rows leave out.
    pub fn album_tracks(&self) -> Vec<RawTrack> {
        let header = self.header();
        let album_title = header.map(|h| h.title.joined()).filter(|t| !t.trim().is_empty());
        let album_artists: Vec<RawArtist> = header
            .map(|h| {
                let text = if h.strapline_text_one.runs.is_empty() {
                    &h.subtitle
                } else {
                    &h.strapline_text_one
                };
                text.runs
                    .iter()
                    .filter(|r| r.browse_id().map_or(false, |id| id.starts_with("UC")))
                    .map(|r| RawArtist {
                        name: r.text.clone(),
                        id: r.browse_id().map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let album_art = header.map(|h| h.thumbnail.thumbnails()).unwrap_or_default();

        self.section_lists()
            .into_iter()
            .flat_map(SectionList::shelves)
            .flat_map(MusicShelf::tracks)
            .map(|mut track| {
                if track.album.is_none() {
                    track.album = album_title.clone();
                }
                if track.artists.is_empty() {
                    track.artists = album_artists.clone();
                }
                if track.thumbnails.is_empty() {
                    track.thumbnails = album_art.clone();
                }
                track
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Watch playlist ("next")
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextResponse {
    pub contents: Option<NextContents>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextContents {
    pub single_column_music_watch_next_results_renderer: Option<WatchNextResults>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchNextResults {
    pub tabbed_renderer: Option<WatchNextTabbed>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchNextTabbed {
    pub watch_next_tabbed_results_renderer: Option<TabbedResults>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MusicQueue {
    pub content: Option<MusicQueueContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicQueueContent {
    pub playlist_panel_renderer: Option<PlaylistPanel>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaylistPanel {
    #[serde(default, deserialize_with = "lenient_list")]
    pub contents: Vec<PanelEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelEntry {
    pub playlist_panel_video_renderer: Option<PanelVideo>,
    pub playlist_panel_video_wrapper_renderer: Option<PanelVideoWrapper>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelVideoWrapper {
    pub primary_renderer: Option<Box<PanelEntry>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelVideo {
    #[serde(default)]
    pub title: Text,
    #[serde(default)]
    pub long_byline_text: Text,
    pub video_id: Option<String>,
    pub length_text: Option<Text>,
    #[serde(default)]
    pub thumbnail: ThumbnailList,
}

impl PanelEntry {
    fn video(&self) -> Option<&PanelVideo> {
        self.playlist_panel_video_renderer.as_ref().or_else(|| {
            self.playlist_panel_video_wrapper_renderer
                .as_ref()
                .and_then(|w| w.primary_renderer.as_deref())
                .and_then(PanelEntry::video)
        })
    }
}

impl PanelVideo {
    fn to_track(&self) -> RawTrack {
        let SongRuns { artists, album, duration, year } = parse_song_runs(&self.long_byline_text.runs);
        RawTrack {
            video_id: self.video_id.clone(),
            title: Some(self.title.joined()),
            artists,
            album,
            duration: self.length_text.as_ref().map(Text::joined).or(duration),
            year,
            thumbnails: self.thumbnail.thumbnails.clone(),
        }
    }
}

impl NextResponse {
    pub fn tracks(&self) -> Vec<RawTrack> {
        self.contents
            .as_ref()
            .and_then(|c| c.single_column_music_watch_next_results_renderer.as_ref())
            .and_then(|r| r.tabbed_renderer.as_ref())
            .and_then(|t| t.watch_next_tabbed_results_renderer.as_ref())
            .and_then(|t| t.tabs.first())
            .and_then(|t| t.tab_renderer.as_ref())
            .and_then(|t| t.content.as_ref())
            .and_then(|c| c.music_queue_renderer.as_ref())
            .and_then(|q| q.content.as_ref())
            .and_then(|c| c.playlist_panel_renderer.as_ref())
            .map(|panel| {
                panel
                    .contents
                    .iter()
                    .filter_map(PanelEntry::video)
                    .map(PanelVideo::to_track)
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub playability_status: Option<PlayabilityStatus>,
    pub video_details: Option<VideoDetails>,
    pub streaming_data: Option<StreamingData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayabilityStatus {
    pub status: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub length_seconds: Option<String>,
    #[serde(default)]
    pub is_live_content: bool,
    #[serde(default)]
    pub thumbnail: ThumbnailList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingData {
    #[serde(default)]
    pub adaptive_formats: Vec<RawFormat>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFormat {
    #[serde(default)]
    pub itag: u32,
    pub url: Option<String>,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub bitrate: u64,
    pub average_bitrate: Option<u64>,
    pub drm_families: Option<Vec<String>>,
}

impl PlayerResponse {
    pub fn into_info(self, requested_id: &str) -> PlayerInfo {
        let status = self.playability_status.unwrap_or_default();
        if let Some(reason) = &status.reason {
            log::debug!("Playability for {}: {:?} ({})", requested_id, status.status, reason);
        }
        let details = self.video_details.unwrap_or_default();
        let audio_formats = self
            .streaming_data
            .map(|data| data.adaptive_formats)
            .unwrap_or_default()
            .into_iter()
            .map(|f| AudioFormat {
                itag: f.itag,
                url: f.url,
                mime_type: f.mime_type,
                bitrate: f.bitrate,
                average_bitrate: f.average_bitrate,
                drm: f.drm_families.map_or(false, |families| !families.is_empty()),
            })
            .filter(AudioFormat::is_audio)
            .collect();

        PlayerInfo {
            video_id: details.video_id.unwrap_or_else(|| requested_id.to_string()),
            playable: status.status.as_deref() == Some("OK"),
            is_live: details.is_live_content,
            title: details.title,
            author: details.author,
            length_seconds: details.length_seconds.and_then(|s| s.parse().ok()),
            thumbnails: details.thumbnail.thumbnails,
            audio_formats,
        }
    }
}
