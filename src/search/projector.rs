//! Pure mapping from raw upstream records to the public output shapes.

use crate::api::{ArtistSong, RelatedSong, SearchResult, SongDetails};
use crate::errors::ConversionError;
use crate::upstream::media::{pick_album_art, select_audio_url};
use crate::upstream::{PlayerInfo, RawTrack};

use super::request::{MediaOptions, SongQuery};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Album art and stream URL resolved for one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedMedia {
    pub album_art: Option<String>,
    pub audio_url: Option<String>,
}

pub fn video_id(track: &RawTrack) -> Result<&str, ConversionError> {
    track
        .video_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(ConversionError::MissingVideoId)
}

pub fn display_title(track: &RawTrack) -> String {
    track
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNKNOWN_TITLE)
        .to_string()
}

pub fn display_artists(track: &RawTrack, fallback: &str) -> String {
    let names = track.artist_names();
    if names.is_empty() {
        fallback.to_string()
    } else {
        names.join(", ")
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn resolve_media(
    track: &RawTrack,
    player: Option<&PlayerInfo>,
    media: &MediaOptions,
) -> Result<ResolvedMedia, ConversionError> {
    let id = video_id(track)?;
    let player_thumbnails = player.map(|p| p.thumbnails.as_slice()).unwrap_or_default();

    let album_art = if media.include_album_art {
        pick_album_art(&track.thumbnails, player_thumbnails, media.thumb_quality)
    } else {
        None
    };

    let audio_url = if media.include_audio_url {
        let formats = player.map(|p| p.audio_formats.as_slice()).unwrap_or_default();
        match select_audio_url(formats, media.audio_quality) {
            Some(url) => Some(url),
            None => return Err(ConversionError::AudioUnavailable(id.to_string())),
        }
    } else {
        None
    };

    Ok(ResolvedMedia { album_art, audio_url })
}

pub fn to_search_result(track: &RawTrack, media: ResolvedMedia) -> Result<SearchResult, ConversionError> {
    Ok(SearchResult {
        title: display_title(track),
        artists: display_artists(track, UNKNOWN_ARTIST),
        video_id: video_id(track)?.to_string(),
        duration: non_empty(&track.duration),
        year: non_empty(&track.year),
        album_art: media.album_art,
        audio_url: media.audio_url,
    })
}

pub fn to_related_song(
    track: &RawTrack,
    media: ResolvedMedia,
    is_original: bool,
) -> Result<RelatedSong, ConversionError> {
    Ok(RelatedSong {
        title: display_title(track),
        artists: display_artists(track, UNKNOWN_ARTIST),
        video_id: video_id(track)?.to_string(),
        duration: non_empty(&track.duration),
        album_art: media.album_art,
        audio_url: media.audio_url,
        is_original,
    })
}

/// Rows from an artist page often omit the artist, so the requested name
/// stands in.
pub fn to_artist_song(
    track: &RawTrack,
    media: ResolvedMedia,
    artist_name: &str,
) -> Result<ArtistSong, ConversionError> {
    Ok(ArtistSong {
        title: display_title(track),
        artists: display_artists(track, artist_name),
        video_id: video_id(track)?.to_string(),
        duration: non_empty(&track.duration),
        album_art: media.album_art,
        audio_url: media.audio_url,
        artist_name: artist_name.to_string(),
    })
}

pub fn to_song_details(
    track: &RawTrack,
    media: ResolvedMedia,
    query: &SongQuery,
) -> Result<SongDetails, ConversionError> {
    Ok(SongDetails {
        title: display_title(track),
        artists: display_artists(track, UNKNOWN_ARTIST),
        video_id: video_id(track)?.to_string(),
        duration: non_empty(&track.duration),
        year: non_empty(&track.year),
        album: non_empty(&track.album),
        album_art: media.album_art,
        audio_url: media.audio_url,
        song_name: query.song_name.clone(),
        artist_name: query.artist_name.clone(),
    })
}
