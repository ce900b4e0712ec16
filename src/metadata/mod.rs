pub mod lrc;
pub mod lyrics;

pub use lyrics::LyricsProvider;
