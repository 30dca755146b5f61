use flowchat_core::{ChatTurn, FlowClient, FlowResult, Transcript};
use tokio::task::JoinHandle;

use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Conversation
    pub client: FlowClient,
    pub transcript: Transcript,
    pub pending: Option<JoinHandle<FlowResult>>,

    // Input box
    pub input: String,
    pub cursor: usize, // cursor position in chars, not bytes

    // Chat view
    pub scroll: u16,
    pub chat_height: u16, // inner height of the chat area, set during render
    pub chat_width: u16,  // inner width, used for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(client: FlowClient) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            client,
            transcript: Transcript::new(),
            pending: None,
            input: String::new(),
            cursor: 0,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Send the input box contents as a user turn.
    ///
    /// Returns false when nothing was sent: blank input, or a request is
    /// already in flight.
    pub fn submit_input(&mut self) -> bool {
        if self.input.trim().is_empty() || self.is_loading() {
            return false;
        }

        let message = std::mem::take(&mut self.input);
        self.cursor = 0;
        tracing::info!("User: {}", message);
        self.transcript.append(ChatTurn::user(message.as_str()));

        let client = self.client.clone();
        self.pending = Some(tokio::spawn(async move {
            client.run_flow(&message, None, None).await
        }));

        // Scroll to bottom so "Thinking..." is visible
        self.scroll_to_bottom();
        true
    }

    /// Move a finished request's outcome into the transcript.
    pub async fn poll_pending(&mut self) {
        let finished = self
            .pending
            .as_ref()
            .map(|handle| handle.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(handle) = self.pending.take() {
            match handle.await {
                Ok(result) => {
                    self.transcript.record(&result);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Flow task did not complete");
                    self.transcript
                        .append(ChatTurn::error(format!("Request task failed: {e}")));
                }
            }
            self.animation_frame = 0;
            self.scroll_to_bottom();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    fn max_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.total_chat_lines().saturating_sub(visible_height)
    }

    /// Rendered height of the transcript at the current chat width,
    /// counted with the same word wrapping the chat view uses.
    fn total_chat_lines(&self) -> u16 {
        // Default to 50 until the first render sets the real width
        let wrap_width = if self.chat_width > 0 { self.chat_width } else { 50 };
        let count = ui::chat_paragraph(self).line_count(wrap_width);
        u16::try_from(count).unwrap_or(u16::MAX)
    }

    pub fn end_session(self) -> Transcript {
        if let Some(handle) = &self.pending {
            handle.abort();
        }
        tracing::info!(turns = self.transcript.len(), "Chat session ended");
        self.transcript
    }
}
