//! UI-agnostic conversation state types
//!
//! These are shared by every front-end and don't depend on any specific UI
//! framework.

use serde::{Deserialize, Serialize};

/// A chat message in the conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub sender: Sender,
    pub rendering: Rendering,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            rendering: Rendering::Plain,
        }
    }

    /// Assistant reply from the backend, rendered with light formatting
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Assistant,
            rendering: Rendering::LightlyFormatted,
        }
    }

    /// Assistant-side message produced locally (e.g. the failure fallback)
    pub fn assistant_plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Assistant,
            rendering: Rendering::Plain,
        }
    }
}

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// How a message body is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rendering {
    Plain,
    LightlyFormatted,
}

/// Connection/conversation state of the chat widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiState {
    #[default]
    Disconnected,
    Connected,
    AwaitingReply,
}

/// Which panels are visible for a given [`UiState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panels {
    pub connect: bool,
    pub chat: bool,
    pub input_enabled: bool,
    pub pending: bool,
}

impl UiState {
    pub fn panels(self) -> Panels {
        match self {
            UiState::Disconnected => Panels {
                connect: true,
                chat: false,
                input_enabled: false,
                pending: false,
            },
            UiState::Connected => Panels {
                connect: false,
                chat: true,
                input_enabled: true,
                pending: false,
            },
            UiState::AwaitingReply => Panels {
                connect: false,
                chat: true,
                input_enabled: false,
                pending: true,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UiState::Disconnected => "disconnected",
            UiState::Connected => "connected",
            UiState::AwaitingReply => "awaiting reply",
        }
    }
}
