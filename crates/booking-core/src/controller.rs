//! The chat controller: session probe, view switching, composing and
//! rendering a single conversation.
//!
//! All mutation goes through `&mut self`. Front-ends that keep an event loop
//! running while a request is in flight use the split forms
//! ([`ChatController::begin_submit`] / [`ChatController::finish_submit`],
//! [`ChatController::probe_started`] / [`ChatController::finish_probe`]) and
//! drive the [`Transport`] themselves.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::{TalkRequest, TalkResponse};
use crate::error::Result;
use crate::state::{ChatMessage, UiState};
use crate::timezone;
use crate::transcript::ViewPort;
use crate::transport::Transport;

pub const FALLBACK_REPLY: &str = "Something went wrong.";

/// Client-side values sent along with every turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: String,
    /// IANA identifier
    pub timezone: String,
    pub send_client_time: bool,
}

/// Result of one submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty input, or not in a state that accepts input
    Ignored,
    /// Assistant reply appended
    Replied,
    /// Backend answered without usable content
    NoReply,
    /// Fallback message appended
    Failed,
}

pub struct ChatController<V: ViewPort> {
    transport: Arc<dyn Transport>,
    view: V,
    settings: ClientSettings,
    state: UiState,
    conversation_id: Option<String>,
    probing: bool,
}

impl<V: ViewPort> ChatController<V> {
    pub fn new(transport: Arc<dyn Transport>, mut view: V, settings: ClientSettings) -> Self {
        view.set_state(UiState::Disconnected);
        Self {
            transport,
            view,
            settings,
            state: UiState::Disconnected,
            conversation_id: None,
            probing: false,
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Shared handle for running requests outside the controller
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    pub fn is_probing(&self) -> bool {
        self.probing
    }

    /// Send is enabled only while connected and with non-blank input
    pub fn can_send(&self, input: &str) -> bool {
        self.state.panels().input_enabled && !input.trim().is_empty()
    }

    /// Page that starts the out-of-band calendar connection flow
    pub fn connect_url(&self) -> String {
        format!("{}/connect-calendar", self.settings.base_url.trim_end_matches('/'))
    }

    fn transition(&mut self, next: UiState) {
        if self.state != next {
            debug!(from = self.state.as_str(), to = next.as_str(), "ui state change");
        }
        self.state = next;
        self.view.set_state(next);
    }

    // ---- session probe ----

    pub fn probe_started(&mut self) {
        self.probing = true;
    }

    pub fn finish_probe(&mut self, result: Result<()>) {
        self.probing = false;
        match result {
            Ok(()) => {
                info!("session active");
                if self.state == UiState::Disconnected {
                    self.transition(UiState::Connected);
                }
            }
            Err(e) => {
                info!(error = %e, "no active session");
                // An in-flight reply still has to land
                if self.state != UiState::AwaitingReply {
                    self.transition(UiState::Disconnected);
                }
            }
        }
    }

    /// Check the backend session once and switch views accordingly
    pub async fn probe(&mut self) {
        self.probe_started();
        let result = self.transport.check_session().await;
        self.finish_probe(result);
    }

    // ---- composer ----

    /// Validate input, render it, and enter the awaiting state.
    ///
    /// Returns the request to send, or `None` if the submit was a no-op.
    pub fn begin_submit(&mut self, raw: &str) -> Option<TalkRequest> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        if self.state != UiState::Connected {
            debug!(state = self.state.as_str(), "submit ignored");
            return None;
        }

        self.view.append_message(&ChatMessage::user(text));
        self.transition(UiState::AwaitingReply);
        self.view.show_pending();

        let client_time = self
            .settings
            .send_client_time
            .then(|| timezone::client_time(&self.settings.timezone));

        Some(TalkRequest {
            query: text.to_string(),
            timezone: self.settings.timezone.clone(),
            client_time,
            conversation_id: self.conversation_id.clone(),
        })
    }

    /// Apply the outcome of the request returned by [`Self::begin_submit`]
    pub fn finish_submit(&mut self, result: Result<TalkResponse>) -> SubmitOutcome {
        if self.state != UiState::AwaitingReply {
            warn!(state = self.state.as_str(), "talk result without a pending request");
            return SubmitOutcome::Ignored;
        }

        self.view.clear_pending();

        let outcome = match result {
            Ok(response) => {
                if let Some(id) = response.conversation_id.as_deref().filter(|id| !id.is_empty()) {
                    if self.conversation_id.as_deref() != Some(id) {
                        info!(conversation_id = id, "conversation assigned");
                    }
                    self.conversation_id = Some(id.to_string());
                }

                match response.reply() {
                    Some(reply) => {
                        self.view.append_message(&ChatMessage::assistant(reply));
                        SubmitOutcome::Replied
                    }
                    None => {
                        debug!("talk response had no reply content");
                        SubmitOutcome::NoReply
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "talk request failed");
                self.view.append_message(&ChatMessage::assistant_plain(FALLBACK_REPLY));
                SubmitOutcome::Failed
            }
        };

        self.transition(UiState::Connected);
        outcome
    }

    /// One full turn: render, send once, render the reply or the fallback
    pub async fn submit(&mut self, raw: &str) -> SubmitOutcome {
        let Some(request) = self.begin_submit(raw) else {
            return SubmitOutcome::Ignored;
        };
        let result = self.transport.talk(&request).await;
        self.finish_submit(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::state::{Rendering, Sender};
    use crate::transcript::Transcript;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted transport recording every talk request
    #[derive(Default)]
    struct FakeTransport {
        session_ok: bool,
        replies: Mutex<VecDeque<Result<TalkResponse>>>,
        requests: Mutex<Vec<TalkRequest>>,
    }

    impl FakeTransport {
        fn connected() -> Self {
            Self {
                session_ok: true,
                ..Default::default()
            }
        }

        fn push_reply(&self, reply: Result<TalkResponse>) {
            self.replies.lock().unwrap().push_back(reply);
        }

        fn requests(&self) -> Vec<TalkRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn check_session(&self) -> Result<()> {
            if self.session_ok {
                Ok(())
            } else {
                Err(TransportError::Status(reqwest::StatusCode::UNAUTHORIZED))
            }
        }

        async fn talk(&self, request: &TalkRequest) -> Result<TalkResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Decode("no scripted reply".to_string())))
        }
    }

    fn settings() -> ClientSettings {
        ClientSettings {
            base_url: "http://localhost:8000/".to_string(),
            timezone: "Asia/Kolkata".to_string(),
            send_client_time: false,
        }
    }

    fn reply(id: Option<&str>, content: &str) -> Result<TalkResponse> {
        Ok(serde_json::from_value(serde_json::json!({
            "conversation_id": id,
            "messages": [{ "content": content }]
        }))
        .unwrap())
    }

    async fn connected_controller() -> (Arc<FakeTransport>, ChatController<Transcript>) {
        let transport = Arc::new(FakeTransport::connected());
        let mut controller = ChatController::new(transport.clone(), Transcript::new(), settings());
        controller.probe().await;
        (transport, controller)
    }

    #[tokio::test]
    async fn test_probe_success_connects() {
        let (_, controller) = connected_controller().await;
        assert_eq!(controller.state(), UiState::Connected);
        assert_eq!(controller.view().state(), UiState::Connected);
        assert!(!controller.is_probing());
    }

    #[tokio::test]
    async fn test_probe_failure_stays_disconnected() {
        let transport = Arc::new(FakeTransport::default());
        let mut controller = ChatController::new(transport, Transcript::new(), settings());
        controller.probe().await;

        assert_eq!(controller.state(), UiState::Disconnected);
        assert!(controller.state().panels().connect);
        assert!(controller.view().is_empty());
    }

    #[tokio::test]
    async fn test_empty_submit_is_noop() {
        let (transport, mut controller) = connected_controller().await;

        for input in ["", "   ", "\n\t "] {
            assert_eq!(controller.submit(input).await, SubmitOutcome::Ignored);
        }

        assert!(controller.view().is_empty());
        assert_eq!(controller.state(), UiState::Connected);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_begin_submit_renders_user_message_first() {
        let (transport, mut controller) = connected_controller().await;

        let request = controller.begin_submit("  Book a room  ").unwrap();

        assert_eq!(request.query, "Book a room");
        assert_eq!(request.timezone, "Asia/Kolkata");
        assert!(request.conversation_id.is_none());
        assert!(request.client_time.is_none());

        let messages = controller.view().messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Book a room");
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(controller.state(), UiState::AwaitingReply);
        assert!(controller.view().is_pending());
        assert!(!controller.can_send("another"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_second_submit_while_awaiting_is_ignored() {
        let (_, mut controller) = connected_controller().await;

        assert!(controller.begin_submit("first").is_some());
        assert!(controller.begin_submit("second").is_none());
        assert_eq!(controller.view().len(), 1);
    }

    #[tokio::test]
    async fn test_reply_scenario() {
        let (transport, mut controller) = connected_controller().await;
        transport.push_reply(reply(None, "Done"));

        assert_eq!(controller.submit("Book a room").await, SubmitOutcome::Replied);

        let messages = controller.view().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].text, "Done");
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert_eq!(messages[1].rendering, Rendering::LightlyFormatted);
        assert_eq!(controller.state(), UiState::Connected);
        assert!(!controller.view().is_pending());
        assert!(controller.can_send("next"));
    }

    #[tokio::test]
    async fn test_conversation_id_round_trip() {
        let (transport, mut controller) = connected_controller().await;
        transport.push_reply(reply(Some("abc"), "hi"));
        transport.push_reply(reply(None, "again"));

        controller.submit("hello").await;
        assert_eq!(controller.conversation_id(), Some("abc"));

        controller.submit("follow up").await;
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].conversation_id, None);
        assert_eq!(requests[1].conversation_id.as_deref(), Some("abc"));
        // A response without an id keeps the existing one
        assert_eq!(controller.conversation_id(), Some("abc"));
    }

    #[tokio::test]
    async fn test_network_failure_shows_fallback() {
        let (transport, mut controller) = connected_controller().await;
        transport.push_reply(reply(Some("abc"), "hi"));
        controller.submit("hello").await;

        transport.push_reply(Err(TransportError::Status(
            reqwest::StatusCode::BAD_GATEWAY,
        )));
        assert_eq!(controller.submit("are you there").await, SubmitOutcome::Failed);

        let last = controller.view().messages().last().unwrap().clone();
        assert_eq!(last.text, FALLBACK_REPLY);
        assert_eq!(last.sender, Sender::Assistant);
        assert_eq!(last.rendering, Rendering::Plain);
        assert_eq!(controller.state(), UiState::Connected);
        assert_eq!(controller.conversation_id(), Some("abc"));
        assert!(!controller.view().is_pending());
    }

    #[tokio::test]
    async fn test_empty_reply_appends_nothing() {
        let (transport, mut controller) = connected_controller().await;
        transport.push_reply(reply(Some("abc"), ""));

        assert_eq!(controller.submit("hello").await, SubmitOutcome::NoReply);
        assert_eq!(controller.view().len(), 1);
        assert_eq!(controller.conversation_id(), Some("abc"));
        assert_eq!(controller.state(), UiState::Connected);
    }

    #[tokio::test]
    async fn test_submit_while_disconnected_is_ignored() {
        let transport = Arc::new(FakeTransport::default());
        let mut controller = ChatController::new(transport.clone(), Transcript::new(), settings());

        assert_eq!(controller.submit("hello").await, SubmitOutcome::Ignored);
        assert!(controller.view().is_empty());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_stray_finish_is_ignored() {
        let (_, mut controller) = connected_controller().await;
        assert_eq!(controller.finish_submit(reply(None, "late")), SubmitOutcome::Ignored);
        assert!(controller.view().is_empty());
    }

    #[tokio::test]
    async fn test_failed_reprobe_during_reply_keeps_awaiting() {
        let (_, mut controller) = connected_controller().await;
        controller.begin_submit("hello");

        controller.finish_probe(Err(TransportError::Decode("boom".to_string())));
        assert_eq!(controller.state(), UiState::AwaitingReply);
    }

    #[test]
    fn test_client_time_included_when_enabled() {
        let transport = Arc::new(FakeTransport::connected());
        let mut controller = ChatController::new(
            transport,
            Transcript::new(),
            ClientSettings {
                send_client_time: true,
                ..settings()
            },
        );
        controller.finish_probe(Ok(()));

        let request = controller.begin_submit("hi").unwrap();
        let stamp = request.client_time.unwrap();
        assert!(stamp.ends_with("+05:30"));
    }

    #[test]
    fn test_connect_url() {
        let controller = ChatController::new(
            Arc::new(FakeTransport::default()),
            Transcript::new(),
            settings(),
        );
        assert_eq!(controller.connect_url(), "http://localhost:8000/connect-calendar");
    }
}
