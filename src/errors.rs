use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("YTMusic API not initialized. Call initialize() first.")]
    NotInitialized,

    #[error("Initialization failed: {0}")]
    Init(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Record conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Short machine-readable category carried in `MethodError::details`.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation",
            AppError::NotInitialized => "not_initialized",
            AppError::Upstream(_) | AppError::Http(_) | AppError::Json(_) => "upstream",
            AppError::Conversion(_)
            | AppError::Config(_)
            | AppError::Io(_)
            | AppError::Init(_)
            | AppError::Url(_) => "internal",
        }
    }
}

/// A single upstream record that could not be turned into an output shape.
/// These never fail a whole batch; callers log and skip the record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("record has no videoId")]
    MissingVideoId,

    #[error("no playable audio stream for {0}")]
    AudioUnavailable(String),

    #[error("media lookup failed for {video_id}: {message}")]
    Media { video_id: String, message: String },
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes reported across the method/event channel boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidQuery,
    StreamError,
    StatusError,
    InitError,
    SearchError,
    RelatedError,
    SongDetailsError,
    ArtistSongsError,
    LyricsError,
    DisposeError,
    NotImplemented,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidQuery => "INVALID_QUERY",
            ErrorCode::StreamError => "STREAM_ERROR",
            ErrorCode::StatusError => "STATUS_ERROR",
            ErrorCode::InitError => "INIT_ERROR",
            ErrorCode::SearchError => "SEARCH_ERROR",
            ErrorCode::RelatedError => "RELATED_ERROR",
            ErrorCode::SongDetailsError => "SONG_DETAILS_ERROR",
            ErrorCode::ArtistSongsError => "ARTIST_SONGS_ERROR",
            ErrorCode::LyricsError => "LYRICS_ERROR",
            ErrorCode::DisposeError => "DISPOSE_ERROR",
            ErrorCode::NotImplemented => "NOT_IMPLEMENTED",
        }
    }
}

/// The `(errorCode, humanMessage, details)` triple handed back to callers.
#[derive(Error, Debug, Clone, Serialize, PartialEq)]
#[error("{code}: {message}")]
pub struct MethodError {
    pub code: String,
    pub message: String,
    pub details: Option<Value>,
}

impl MethodError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_str().to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn from_app(code: ErrorCode, context: &str, error: &AppError) -> Self {
        let mut details = json!({ "kind": error.kind() });
        if let AppError::Validation { field, .. } = error {
            details["field"] = Value::String(field.clone());
        }
        Self {
            code: code.as_str().to_string(),
            message: format!("{}: {}", context, error),
            details: Some(details),
        }
    }

    pub fn not_implemented(method: &str) -> Self {
        Self::new(
            ErrorCode::NotImplemented,
            format!("Method not implemented: {}", method),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_carry_field_in_details() {
        let error = AppError::validation("query", "Query is required");
        let method_error = MethodError::from_app(ErrorCode::SearchError, "Search failed", &error);

        assert_eq!(method_error.code, "SEARCH_ERROR");
        assert!(method_error.message.contains("Query is required"));
        let details = method_error.details.unwrap();
        assert_eq!(details["kind"], "validation");
        assert_eq!(details["field"], "query");
    }

    #[test]
    fn not_initialized_maps_to_its_own_kind() {
        let method_error =
            MethodError::from_app(ErrorCode::RelatedError, "Get related songs failed", &AppError::NotInitialized);
        assert_eq!(method_error.details.unwrap()["kind"], "not_initialized");
        assert!(method_error.message.contains("initialize()"));
    }

    #[test]
    fn conversion_errors_report_as_internal() {
        let error = AppError::from(ConversionError::MissingVideoId);
        assert_eq!(error.kind(), "internal");
        let method_error = MethodError::from_app(ErrorCode::StreamError, "Stream failed", &error);
        let details = method_error.details.unwrap();
        assert_eq!(details["kind"], "internal");
        assert!(details.get("field").is_none());
    }
}
