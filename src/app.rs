use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use booking_core::error::Result as TransportResult;
use booking_core::{ChatController, TalkResponse, Transcript, Transport, TransportError, UiState};
use crate::ui;

pub struct App {
    pub should_quit: bool,
    pub controller: ChatController<Transcript>,

    // Composer state
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Transcript viewport
    pub scroll: u16,
    pub chat_height: u16, // inner height of the transcript pane
    pub chat_width: u16,  // inner width, for wrap calculations
    pub chat_area: Option<Rect>,

    // In-flight requests
    pub talk_task: Option<JoinHandle<TransportResult<TalkResponse>>>,
    pub probe_task: Option<JoinHandle<TransportResult<()>>>,

    /// One-line notice shown in the footer (e.g. browser launch failure)
    pub notice: Option<String>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(controller: ChatController<Transcript>) -> Self {
        Self {
            should_quit: false,
            controller,
            input: String::new(),
            cursor: 0,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,
            talk_task: None,
            probe_task: None,
            notice: None,
            animation_frame: 0,
        }
    }

    pub fn state(&self) -> UiState {
        self.controller.state()
    }

    pub fn transcript(&self) -> &Transcript {
        self.controller.view()
    }

    pub fn can_send(&self) -> bool {
        self.talk_task.is_none() && self.controller.can_send(&self.input)
    }

    /// Check the backend session in the background (start-up and reload)
    pub fn start_probe(&mut self) {
        if self.probe_task.is_some() {
            return;
        }
        self.notice = None;
        self.controller.probe_started();
        let transport = self.controller.transport();
        self.probe_task = Some(tokio::spawn(async move { transport.check_session().await }));
    }

    /// Hand the composer text to the controller and send it in the background
    pub fn submit_input(&mut self) {
        if self.talk_task.is_some() {
            return;
        }
        let Some(request) = self.controller.begin_submit(&self.input) else {
            return;
        };

        self.input.clear();
        self.cursor = 0;

        let transport = self.controller.transport();
        self.talk_task = Some(tokio::spawn(async move { transport.talk(&request).await }));
    }

    /// Apply results of finished background requests
    pub async fn poll_tasks(&mut self) {
        if self.probe_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.probe_task.take() {
                let result = task.await.unwrap_or_else(|e| Err(TransportError::Aborted(e.to_string())));
                self.controller.finish_probe(result);
            }
        }

        if self.talk_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.talk_task.take() {
                let result = task.await.unwrap_or_else(|e| Err(TransportError::Aborted(e.to_string())));
                let outcome = self.controller.finish_submit(result);
                info!(?outcome, "turn finished");
            }
        }
    }

    /// Open the calendar connection page in the system browser
    pub fn open_connect_page(&mut self) {
        let url = self.controller.connect_url();
        match open::that(&url) {
            Ok(()) => {
                info!(%url, "opened connect page");
                self.notice = Some("Finish connecting in your browser, then press r".to_string());
            }
            Err(e) => {
                warn!(%url, error = %e, "could not open browser");
                self.notice = Some(format!("Open {} in your browser", url));
            }
        }
    }

    pub fn tick_animation(&mut self) {
        if self.transcript().is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Jump to the newest entry if the transcript asked for it
    pub fn follow_transcript(&mut self) {
        if self.controller.view_mut().take_follow() {
            self.scroll_to_bottom();
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll());
    }

    pub fn max_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.transcript_line_count().saturating_sub(visible_height)
    }

    /// Rendered height of the transcript, wrapped the way the renderer wraps it
    pub fn transcript_line_count(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 { self.chat_width } else { 50 };
        let rows = ui::transcript_paragraph(self).line_count(wrap_width);
        u16::try_from(rows).unwrap_or(u16::MAX)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use booking_core::{
        ChatMessage, ClientSettings, Sender, TalkMessage, TalkRequest, ViewPort,
        FALLBACK_REPLY,
    };
    use std::sync::Arc;
    use std::time::Duration;

    /// Answers every turn with a fixed reply, or fails if none is set
    pub(crate) struct StubTransport {
        pub reply: Option<String>,
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn check_session(&self) -> TransportResult<()> {
            Ok(())
        }

        async fn talk(&self, request: &TalkRequest) -> TransportResult<TalkResponse> {
            assert!(!request.query.is_empty());
            match &self.reply {
                Some(reply) => Ok(TalkResponse {
                    conversation_id: Some("conv-1".to_string()),
                    messages: vec![TalkMessage {
                        content: Some(reply.clone()),
                    }],
                }),
                None => Err(TransportError::Decode("offline".to_string())),
            }
        }
    }

    pub(crate) fn test_app(reply: Option<&str>) -> App {
        let transport = Arc::new(StubTransport {
            reply: reply.map(str::to_string),
        });
        let settings = ClientSettings {
            base_url: "http://localhost:8000".to_string(),
            timezone: "UTC".to_string(),
            send_client_time: false,
        };
        App::new(ChatController::new(transport, Transcript::new(), settings))
    }

    pub(crate) fn connected_app(reply: Option<&str>) -> App {
        let mut app = test_app(reply);
        app.controller.finish_probe(Ok(()));
        app
    }

    async fn settle(app: &mut App) {
        for _ in 0..100 {
            app.poll_tasks().await;
            if app.talk_task.is_none() && app.probe_task.is_none() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("background task did not finish");
    }

    #[tokio::test]
    async fn test_probe_connects() {
        let mut app = test_app(None);
        app.start_probe();
        assert!(app.controller.is_probing());

        settle(&mut app).await;
        assert_eq!(app.state(), UiState::Connected);
        assert!(!app.controller.is_probing());
    }

    #[tokio::test]
    async fn test_submit_clears_input_and_renders_reply() {
        let mut app = connected_app(Some("**Booked** for 10:00"));
        app.input = "Book a room".to_string();
        app.cursor = 11;

        app.submit_input();
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert_eq!(app.state(), UiState::AwaitingReply);
        assert!(!app.can_send());

        settle(&mut app).await;
        let messages = app.transcript().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert_eq!(messages[1].text, "**Booked** for 10:00");
        assert_eq!(app.state(), UiState::Connected);
        assert_eq!(app.controller.conversation_id(), Some("conv-1"));
    }

    #[tokio::test]
    async fn test_repeated_enter_sends_once() {
        let mut app = connected_app(Some("ok"));
        app.input = "hello".to_string();
        app.submit_input();
        app.input = "hello again".to_string();
        app.submit_input();

        assert_eq!(app.transcript().len(), 1);
        assert_eq!(app.input, "hello again");
        settle(&mut app).await;
        assert_eq!(app.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_turn_shows_fallback() {
        let mut app = connected_app(None);
        app.input = "hello".to_string();
        app.submit_input();
        settle(&mut app).await;

        assert_eq!(app.transcript().messages()[1].text, FALLBACK_REPLY);
        assert_eq!(app.state(), UiState::Connected);
    }

    #[test]
    fn test_blank_input_cannot_send() {
        let mut app = connected_app(None);
        app.input = "   ".to_string();
        assert!(!app.can_send());
        app.input = "hi".to_string();
        assert!(app.can_send());
    }

    #[test]
    fn test_follow_scrolls_to_bottom() {
        let mut app = connected_app(None);
        app.chat_height = 4;
        app.chat_width = 40;
        for i in 0..5 {
            app.controller
                .view_mut()
                .append_message(&ChatMessage::user(format!("message {}", i)));
        }

        app.follow_transcript();
        // 5 messages x (label + body + blank) = 15 lines, 4 visible
        assert_eq!(app.transcript_line_count(), 15);
        assert_eq!(app.scroll, 11);

        app.scroll_up(5);
        assert_eq!(app.scroll, 6);
        app.scroll_down(100);
        assert_eq!(app.scroll, 11);
    }
}
