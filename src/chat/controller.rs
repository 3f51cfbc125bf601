use std::sync::Arc;

use tokio::sync::watch;

use crate::backend::provider::QueryBackend;
use crate::backend::types::BackendReply;
use crate::bus::extension::{Delivery, MessageSender};
use crate::bus::message::DispatchMessage;
use crate::chat::message::ChatMessage;
use crate::chat::state::{SessionState, SubmitOutcome};
use crate::directive::parse_locator;
use crate::errors::PageHintResult;

pub const FALLBACK_REPLY: &str = "An error occurred. Please try again.";

/// Owns one popup's conversation and drives the query → highlight flow.
///
/// Built fresh for every popup lifetime; nothing survives it.
pub struct ChatSessionController {
    session_id: String,
    transcript: Vec<ChatMessage>,
    input: String,
    state: watch::Sender<SessionState>,
    backend: Arc<dyn QueryBackend>,
    bus: Arc<dyn MessageSender>,
    fallback_reply: String,
}

enum Finished {
    Answered(Option<DispatchMessage>),
    Failed,
}

impl ChatSessionController {
    pub fn new(backend: Arc<dyn QueryBackend>, bus: Arc<dyn MessageSender>) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        let session_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(session = %session_id, backend = backend.name(), "chat session created");
        Self {
            session_id,
            transcript: Vec::new(),
            input: String::new(),
            state,
            backend,
            bus,
            fallback_reply: FALLBACK_REPLY.to_string(),
        }
    }

    pub fn with_fallback_reply(mut self, text: impl Into<String>) -> Self {
        self.fallback_reply = text.into();
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_pending(&self) -> bool {
        self.state() == SessionState::AwaitingReply
    }

    /// Watch state transitions, e.g. to drive a "typing..." indicator.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Submit the current input buffer.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let input = match self.begin() {
            Ok(input) => input,
            Err(outcome) => return outcome,
        };

        let result = self.backend.query(&input).await;

        match self.finish(result) {
            Finished::Failed => SubmitOutcome::Failed,
            Finished::Answered(None) => SubmitOutcome::Answered { dispatch: None },
            Finished::Answered(Some(message)) => {
                let delivery = self.bus.send(message).await;
                if let Delivery::Undelivered(reason) = &delivery {
                    tracing::debug!(session = %self.session_id, reason = %reason, "highlight not delivered");
                }
                SubmitOutcome::Answered {
                    dispatch: Some(delivery),
                }
            }
        }
    }

    /// Replace the input buffer and submit it.
    pub async fn send_input(&mut self, text: impl Into<String>) -> SubmitOutcome {
        self.set_input(text);
        self.submit().await
    }

    /// idle → awaiting-reply. Returns the text to send.
    fn begin(&mut self) -> Result<String, SubmitOutcome> {
        if self.is_pending() {
            tracing::debug!(session = %self.session_id, "submission ignored while awaiting reply");
            return Err(SubmitOutcome::Busy);
        }
        if self.input.trim().is_empty() {
            return Err(SubmitOutcome::Rejected);
        }

        let input = self.input.clone();
        self.transcript.push(ChatMessage::user(input.clone()));
        self.state.send_replace(SessionState::AwaitingReply);
        tracing::info!(session = %self.session_id, input_len = input.len(), "awaiting backend reply");
        Ok(input)
    }

    /// awaiting-reply → idle. Returns the dispatch message the reply asked for, if any.
    fn finish(&mut self, result: PageHintResult<BackendReply>) -> Finished {
        let finished = match result {
            Ok(reply) => {
                let locator = parse_locator(&reply.text);
                self.transcript.push(ChatMessage::assistant(reply.text));
                match &locator {
                    Some(l) => tracing::info!(
                        session = %self.session_id,
                        selector = %l.value,
                        "reply carries highlight directive"
                    ),
                    None => tracing::debug!(session = %self.session_id, "reply carries no directive"),
                }
                Finished::Answered(locator.map(DispatchMessage::from))
            }
            Err(e) => {
                tracing::warn!(session = %self.session_id, error = %e, "backend request failed");
                self.transcript
                    .push(ChatMessage::assistant(self.fallback_reply.clone()));
                Finished::Failed
            }
        };

        self.input.clear();
        self.state.send_replace(SessionState::Idle);
        finished
    }
}
