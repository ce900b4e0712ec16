pub mod api;
pub mod channel;
pub mod config;
pub mod errors;
pub mod metadata;
pub mod search;
pub mod security;
pub mod upstream;

pub use channel::{MusicBridge, StreamEvent, StreamKind, StreamState, Subscription};
pub use config::AppConfig;
pub use errors::{AppError, ErrorCode, MethodError, Result};
