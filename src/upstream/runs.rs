use regex::Regex;
use std::sync::LazyLock;

use super::responses::Run;
use super::RawArtist;

static DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+:)*\d+:\d+$").expect("duration pattern"));
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}$").expect("year pattern"));
static VIEWS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d[^ ]* [^ ]*$").expect("views pattern"));

const SEPARATORS: &[&str] = &["•", "&", ",", "·"];

/// Fields recovered from a subtitle line such as
/// `Artist • Album • 3:45` or `Artist & Other • 2019`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SongRuns {
    pub artists: Vec<RawArtist>,
    pub album: Option<String>,
    pub duration: Option<String>,
    pub year: Option<String>,
}

pub fn is_album_id(browse_id: &str) -> bool {
    browse_id.starts_with("MPRE") || browse_id.contains("release_detail")
}

pub fn parse_song_runs(runs: &[Run]) -> SongRuns {
    let mut parsed = SongRuns::default();

    for (index, run) in runs.iter().enumerate() {
        let text = run.text.trim();
        if text.is_empty() || SEPARATORS.contains(&text) {
            continue;
        }

        if let Some(browse_id) = run.browse_id() {
            if is_album_id(browse_id) {
                parsed.album = Some(text.to_string());
            } else {
                parsed.artists.push(RawArtist {
                    name: text.to_string(),
                    id: Some(browse_id.to_string()),
                });
            }
            continue;
        }

        if DURATION.is_match(text) {
            parsed.duration = Some(text.to_string());
        } else if YEAR.is_match(text) {
            parsed.year = Some(text.to_string());
        } else if index > 0 && VIEWS.is_match(text) {
            log::trace!("Ignoring play count run: {}", text);
        } else if !matches!(text, "Song" | "Video" | "Single" | "EP" | "Album") {
            parsed.artists.push(RawArtist {
                name: text.to_string(),
                id: None,
            });
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::responses::{BrowseEndpoint, NavigationEndpoint};

    fn plain(text: &str) -> Run {
        Run {
            text: text.to_string(),
            navigation_endpoint: None,
        }
    }

    fn linked(text: &str, browse_id: &str) -> Run {
        Run {
            text: text.to_string(),
            navigation_endpoint: Some(NavigationEndpoint {
                browse_endpoint: Some(BrowseEndpoint {
                    browse_id: browse_id.to_string(),
                }),
                watch_endpoint: None,
            }),
        }
    }

    #[test]
    fn album_and_artist_links_are_told_apart() {
        let parsed = parse_song_runs(&[
            linked("Coldplay", "UCIaFw5VBEK8qaW6nRpx_qnw"),
            plain(" • "),
            linked("Viva la Vida", "MPREb_4pL8gzRtw1p"),
            plain(" • "),
            plain("4:02"),
        ]);

        assert_eq!(parsed.artists.len(), 1);
        assert_eq!(parsed.artists[0].id.as_deref(), Some("UCIaFw5VBEK8qaW6nRpx_qnw"));
        assert_eq!(parsed.album.as_deref(), Some("Viva la Vida"));
        assert_eq!(parsed.duration.as_deref(), Some("4:02"));
    }

    #[test]
    fn unlinked_names_years_and_joiners() {
        let parsed = parse_song_runs(&[
            plain("Artist One"),
            plain(" & "),
            plain("Artist Two"),
            plain(" • "),
            plain("2019"),
            plain(" • "),
            plain("1:02:03"),
        ]);

        let names: Vec<_> = parsed.artists.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Artist One", "Artist Two"]);
        assert_eq!(parsed.year.as_deref(), Some("2019"));
        assert_eq!(parsed.duration.as_deref(), Some("1:02:03"));
        assert!(parsed.album.is_none());
    }

    #[test]
    fn play_counts_are_not_artists() {
        let parsed = parse_song_runs(&[plain("Coldplay"), plain(" • "), plain("1.2B plays")]);
        assert_eq!(parsed.artists.len(), 1);
    }
}
