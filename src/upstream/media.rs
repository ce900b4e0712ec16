use regex::Regex;
use std::sync::LazyLock;

use super::{AudioFormat, Thumbnail};
use crate::api::{AudioQuality, ThumbnailQuality};

static SIZE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"w\d+-h\d+").expect("size token pattern"));

/// Rewrites the `w<N>-h<N>` size token of a Google image URL. URLs without
/// the token (plain ytimg frames) are returned unchanged.
pub fn resize_art(url: &str, quality: ThumbnailQuality) -> String {
    SIZE_TOKEN.replace(url, quality.size_token()).into_owned()
}

fn largest(thumbnails: &[Thumbnail]) -> Option<&Thumbnail> {
    thumbnails.iter().max_by_key(|t| t.area())
}

/// Best cover from the player's video details: square art first, then
/// whatever is largest.
fn best_player_art(thumbnails: &[Thumbnail]) -> Option<&Thumbnail> {
    thumbnails
        .iter()
        .filter(|t| t.is_square())
        .max_by_key(|t| t.area())
        .or_else(|| largest(thumbnails))
}

pub fn pick_album_art(
    track_thumbnails: &[Thumbnail],
    player_thumbnails: &[Thumbnail],
    quality: ThumbnailQuality,
) -> Option<String> {
    let chosen = if quality.prefers_player_art() {
        best_player_art(player_thumbnails).or_else(|| largest(track_thumbnails))
    } else {
        largest(track_thumbnails).or_else(|| largest(player_thumbnails))
    };

    chosen
        .filter(|t| !t.url.is_empty())
        .map(|t| resize_art(&t.url, quality))
}

fn is_direct_stream(format: &AudioFormat) -> bool {
    match &format.url {
        Some(url) => !url.contains(".m3u8") && !url.contains("/manifest/"),
        None => false,
    }
}

/// Picks a direct, DRM-free audio stream URL for the requested tier.
pub fn select_audio_url(formats: &[AudioFormat], quality: AudioQuality) -> Option<String> {
    let mut candidates: Vec<&AudioFormat> = formats
        .iter()
        .filter(|f| f.is_audio() && !f.drm && is_direct_stream(f))
        .collect();
    candidates.sort_by_key(|f| f.effective_bitrate());

    let index = quality.format_index(candidates.len())?;
    let format = candidates[index];
    log::debug!(
        "Selected itag {} ({} bps) for {} audio",
        format.itag,
        format.effective_bitrate(),
        quality.0
    );
    format.url.clone()
}
