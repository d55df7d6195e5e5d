//! Rendering surface abstraction and the in-memory transcript behind it

use crate::state::{ChatMessage, UiState};

/// What the chat controller needs from a rendering surface
pub trait ViewPort {
    fn set_state(&mut self, state: UiState);
    fn append_message(&mut self, message: &ChatMessage);
    fn show_pending(&mut self);
    fn clear_pending(&mut self);
}

/// Append-only message history plus the transient pending indicator.
///
/// Front-ends read it when drawing. `follow` is raised on every append so the
/// next draw scrolls to the newest entry.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    pending: bool,
    state: UiState,
    follow: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    /// Returns whether a scroll-to-bottom is due, and resets the request
    pub fn take_follow(&mut self) -> bool {
        std::mem::take(&mut self.follow)
    }
}

impl ViewPort for Transcript {
    fn set_state(&mut self, state: UiState) {
        self.state = state;
    }

    fn append_message(&mut self, message: &ChatMessage) {
        self.messages.push(message.clone());
        self.follow = true;
    }

    fn show_pending(&mut self) {
        if !self.pending {
            self.pending = true;
            self.follow = true;
        }
    }

    fn clear_pending(&mut self) {
        self.pending = false;
    }
}
