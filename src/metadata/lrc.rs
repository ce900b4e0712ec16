//! LRC clean-up and parsing for KuGou downloads.

use regex::Regex;
use std::sync::LazyLock;

use crate::api::LyricsLine;

/// Credit lines are only looked for this close to either end.
pub const HEAD_CUT_LIMIT: usize = 30;

const INSTRUMENTAL_MARKERS: [&str; 2] = ["纯音乐，请欣赏", "酷狗音乐  就是歌多"];

static ACCEPTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d\d):(\d\d)\.(\d{2,3})\](.*)$").expect("accepted line pattern")
});
static BANNED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+\].+[:：].+").expect("credit line pattern"));
static TITLE_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(.*\)|（.*）|「.*」|『.*』|<.*>|《.*》|〈.*〉|＜.*＞").expect("title pattern")
});
static ARTIST_JOINERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r", | & |\.|和").expect("artist joiner pattern"));
static ARTIST_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*\)|（.*）").expect("artist pattern"));

pub fn normalize_title(title: &str) -> String {
    TITLE_NOISE.replace_all(title, "").trim().to_string()
}

pub fn normalize_artist(artist: &str) -> String {
    let joined = ARTIST_JOINERS.replace_all(artist, "、");
    ARTIST_NOISE.replace_all(&joined, "").trim().to_string()
}

/// Search keyword in the `title - artist` form KuGou expects.
pub fn keyword(title: &str, artist: &str) -> String {
    format!("{} - {}", normalize_title(title), normalize_artist(artist))
}

/// Keeps only timestamped lines and cuts credit blocks
/// (`[..]作词：..`) near the start and the end.
pub fn normalize_lyrics(raw: &str) -> String {
    let raw = raw.replace("&apos;", "'");
    let lines: Vec<&str> = raw
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| ACCEPTED.is_match(line))
        .collect();
    if lines.is_empty() {
        return String::new();
    }

    let head_end = HEAD_CUT_LIMIT.min(lines.len() - 1);
    let start = (0..=head_end)
        .rev()
        .find(|&i| BANNED.is_match(lines[i]))
        .map_or(0, |i| i + 1);

    let tail_start = lines.len().saturating_sub(HEAD_CUT_LIMIT).max(start);
    let end = (tail_start..lines.len())
        .find(|&i| BANNED.is_match(lines[i]))
        .unwrap_or(lines.len());

    lines[start..end].join("\n")
}

pub fn is_instrumental(lyrics: &str) -> bool {
    INSTRUMENTAL_MARKERS.iter().any(|marker| lyrics.contains(marker))
}

pub fn format_timestamp(minutes: u64, seconds: u64, millis: u64) -> String {
    format!("{:02}:{:02}.{:03}", minutes, seconds, millis)
}

/// Parses `[mm:ss.xx]text` lines into timestamped entries sorted by time.
/// Lines without text are dropped.
pub fn parse_lrc(lyrics: &str) -> Vec<LyricsLine> {
    let mut parsed: Vec<LyricsLine> = lyrics
        .lines()
        .filter_map(|line| {
            let captures = ACCEPTED.captures(line.trim_end_matches('\r'))?;
            let minutes: u64 = captures[1].parse().ok()?;
            let seconds: u64 = captures[2].parse().ok()?;
            let fraction = &captures[3];
            let millis: u64 = if fraction.len() == 2 {
                fraction.parse::<u64>().ok()? * 10
            } else {
                fraction.parse().ok()?
            };
            let text = captures[4].trim();
            if text.is_empty() {
                return None;
            }
            Some(LyricsLine {
                timestamp: minutes * 60_000 + seconds * 1_000 + millis,
                text: text.to_string(),
                time_formatted: format_timestamp(minutes, seconds, millis),
            })
        })
        .collect();
    parsed.sort_by_key(|line| line.timestamp);
    parsed
}
