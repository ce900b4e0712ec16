pub mod method;
pub mod stream;

pub use method::{MethodResult, MusicBridge};
pub use stream::{EventChannel, StreamEvent, StreamKind, StreamState, Subscription};
