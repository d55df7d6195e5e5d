pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod state;
pub mod timezone;
pub mod transcript;
pub mod transport;

// Re-export main types for convenience
pub use api::{TalkMessage, TalkRequest, TalkResponse};
pub use config::Config;
pub use controller::{ChatController, ClientSettings, SubmitOutcome, FALLBACK_REPLY};
pub use error::TransportError;
pub use format::{format_light, format_message, to_html, FormattedLine, Segment};
pub use state::{ChatMessage, Panels, Rendering, Sender, UiState};
pub use transcript::{Transcript, ViewPort};
pub use transport::{HttpTransport, Transport};
