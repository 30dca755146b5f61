use crate::config::Settings;
use crate::flow::FlowClient;
use crate::transcript::{ChatTurn, Transcript};

/// One conversation: a flow client plus the transcript it produces.
///
/// Owned by the caller for the length of the conversation. Requests are
/// issued one at a time because `submit` needs `&mut self`.
pub struct ChatSession {
    client: FlowClient,
    transcript: Transcript,
}

impl ChatSession {
    pub fn start(settings: Settings) -> Self {
        tracing::info!(flow_id = %settings.flow_id, "Chat session started");
        Self {
            client: FlowClient::new(settings),
            transcript: Transcript::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Send one user message and record the reply (or the error).
    ///
    /// Blank input is ignored and returns `None`.
    pub async fn submit(&mut self, message: &str) -> Option<&ChatTurn> {
        if message.trim().is_empty() {
            return None;
        }

        tracing::info!("User: {}", message);
        self.transcript.append(ChatTurn::user(message));

        let result = self.client.run_flow(message, None, None).await;
        Some(self.transcript.record(&result))
    }

    pub fn end(self) -> Transcript {
        tracing::info!(turns = self.transcript.len(), "Chat session ended");
        self.transcript
    }
}
