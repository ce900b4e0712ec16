use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered tier used to pick which variant of a media URL to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityTier {
    Low,
    Med,
    High,
    VeryHigh,
}

impl QualityTier {
    pub const ALL: [QualityTier; 4] = [
        QualityTier::Low,
        QualityTier::Med,
        QualityTier::High,
        QualityTier::VeryHigh,
    ];

    pub fn ordinal(self) -> usize {
        match self {
            QualityTier::Low => 0,
            QualityTier::Med => 1,
            QualityTier::High => 2,
            QualityTier::VeryHigh => 3,
        }
    }

    /// Case-insensitive parse of `LOW`, `MED`, `HIGH`, `VERY_HIGH`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(QualityTier::Low),
            "MED" => Some(QualityTier::Med),
            "HIGH" => Some(QualityTier::High),
            "VERY_HIGH" => Some(QualityTier::VeryHigh),
            _ => None,
        }
    }

    pub fn parse_or(value: &str, fallback: QualityTier) -> Self {
        Self::parse(value).unwrap_or_else(|| {
            log::warn!("Unknown quality: {}, using {}", value, fallback);
            fallback
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::Low => "LOW",
            QualityTier::Med => "MED",
            QualityTier::High => "HIGH",
            QualityTier::VeryHigh => "VERY_HIGH",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioQuality(pub QualityTier);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailQuality(pub QualityTier);

impl ThumbnailQuality {
    /// Size token substituted into Google image URLs (`w<N>-h<N>`).
    pub fn size_token(self) -> &'static str {
        match self.0 {
            QualityTier::Low => "w60-h60",
            QualityTier::Med => "w120-h120",
            QualityTier::High => "w320-h320",
            QualityTier::VeryHigh => "w544-h544",
        }
    }

    pub fn prefers_player_art(self) -> bool {
        self.0 >= QualityTier::High
    }
}

impl AudioQuality {
    /// Index into `n` audio formats sorted by ascending bitrate.
    pub fn format_index(self, n: usize) -> Option<usize> {
        if n == 0 {
            return None;
        }
        let span = (n - 1) as f64;
        let index = (self.0.ordinal() as f64 / 3.0 * span).round() as usize;
        Some(index.min(n - 1))
    }
}
