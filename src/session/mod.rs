//! Conversation session orchestration
//!
//! Ties one user utterance to one assistant reply: record the user turn,
//! ask the completion gateway, record the reply (or the persona's fallback
//! line when the gateway fails), then speak it.

mod status;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use crate::Persona;
use crate::conversation::{ConversationStore, Turn};
use crate::gateway::{CompletionGateway, CompletionRequest};
use crate::voice::{DEFAULT_VOICE, SpeechOutcome, SpeechOutputChooser};

pub use status::{Status, StatusGuard, StatusIndicator};

/// Shown and spoken when the gateway answers with nothing
pub const EMPTY_REPLY: &str = "(no reply)";

/// Result of a [`Session::submit`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input was empty after trimming; nothing happened
    Ignored,
    /// Another submission is still running; nothing happened
    Busy,
    /// The gateway replied
    Replied {
        reply: String,
        speech: SpeechOutcome,
    },
    /// The gateway failed; the persona's fallback line was used
    Fallback {
        reply: String,
        speech: SpeechOutcome,
    },
}

impl SubmitOutcome {
    /// Assistant text recorded for this submission, if any
    #[must_use]
    pub fn reply(&self) -> Option<&str> {
        match self {
            Self::Replied { reply, .. } | Self::Fallback { reply, .. } => Some(reply),
            Self::Ignored | Self::Busy => None,
        }
    }
}

/// One conversation with the assistant
pub struct Session {
    persona: Persona,
    store: Mutex<ConversationStore>,
    completion: Arc<dyn CompletionGateway>,
    speech: Arc<SpeechOutputChooser>,
    status: StatusIndicator,
    in_flight: Mutex<()>,
    greeting_pending: AtomicBool,
}

impl Session {
    /// Create a session over a loaded conversation
    #[must_use]
    pub fn new(
        persona: Persona,
        store: ConversationStore,
        completion: Arc<dyn CompletionGateway>,
        speech: Arc<SpeechOutputChooser>,
        status: StatusIndicator,
    ) -> Self {
        Self {
            persona,
            store: Mutex::new(store),
            completion,
            speech,
            status,
            in_flight: Mutex::new(()),
            greeting_pending: AtomicBool::new(false),
        }
    }

    /// Record the first-run greeting if the conversation is empty
    ///
    /// Returns `true` if a greeting was added; [`greet`](Self::greet) then speaks it.
    pub async fn start(&self) -> bool {
        let mut store = self.store.lock().await;
        if !store.is_empty() {
            tracing::debug!(turns = store.len(), "resuming conversation");
            return false;
        }

        store.append(Turn::assistant(self.persona.greeting()));
        store.persist();
        self.greeting_pending.store(true, Ordering::SeqCst);
        tracing::info!(persona = self.persona.id(), "new conversation, greeting recorded");
        true
    }

    /// Speak the pending greeting once
    ///
    /// Returns `None` if there is no greeting to speak.
    pub async fn greet(&self) -> Option<SpeechOutcome> {
        if !self.greeting_pending.swap(false, Ordering::SeqCst) {
            return None;
        }

        let voice = self.persona.tts_voice().unwrap_or(DEFAULT_VOICE);
        Some(
            self.speech
                .speak_with_cloud_voice(self.persona.greeting(), Some(voice))
                .await,
        )
    }

    /// Send one user utterance and speak the reply
    ///
    /// Only one submission runs at a time; a second call while one is in
    /// flight returns [`SubmitOutcome::Busy`] without touching the log.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let Ok(_in_flight) = self.in_flight.try_lock() else {
            tracing::debug!("submission already in flight");
            return SubmitOutcome::Busy;
        };
        let _status = self.status.enter(Status::Processing);

        let request = {
            let mut store = self.store.lock().await;
            let history = store.turns().to_vec();
            store.append(Turn::user(text));
            store.persist();
            CompletionRequest {
                system: self.persona.system_prompt().to_string(),
                history,
                user: text.to_string(),
            }
        };

        let (reply, failed) = match self.completion.complete(&request).await {
            Ok(reply) => (normalize_reply(&reply), false),
            Err(e) => {
                tracing::warn!(error = %e, "completion gateway failed");
                (self.persona.fallback_reply().to_string(), true)
            }
        };

        {
            let mut store = self.store.lock().await;
            store.append(Turn::assistant(reply.clone()));
            store.persist();
        }

        let speech = self.speech.speak(&reply).await;
        tracing::debug!(?speech, failed, "reply delivered");

        if failed {
            SubmitOutcome::Fallback { reply, speech }
        } else {
            SubmitOutcome::Replied { reply, speech }
        }
    }

    /// Forget the conversation, in memory and in storage
    pub async fn reset(&self) {
        self.store.lock().await.clear();
        self.greeting_pending.store(false, Ordering::SeqCst);
        tracing::info!("conversation cleared");
    }

    /// Snapshot of the in-memory conversation, oldest first
    pub async fn turns(&self) -> Vec<Turn> {
        self.store.lock().await.turns().to_vec()
    }

    /// Active persona
    #[must_use]
    pub const fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Shared status indicator
    #[must_use]
    pub const fn status(&self) -> &StatusIndicator {
        &self.status
    }

    /// Speech output used for replies
    #[must_use]
    pub const fn speech(&self) -> &Arc<SpeechOutputChooser> {
        &self.speech
    }

    /// Stop anything still being spoken
    pub async fn shutdown(&self) {
        self.speech.cancel().await;
    }
}

/// Trimmed reply, or [`EMPTY_REPLY`] when there is nothing left
fn normalize_reply(reply: &str) -> String {
    let reply = reply.trim();
    if reply.is_empty() {
        EMPTY_REPLY.to_string()
    } else {
        reply.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replies_are_trimmed() {
        assert_eq!(normalize_reply("  Sunny, sir.\n"), "Sunny, sir.");
    }

    #[test]
    fn test_blank_reply_becomes_placeholder() {
        assert_eq!(normalize_reply(""), EMPTY_REPLY);
        assert_eq!(normalize_reply(" \n\t"), EMPTY_REPLY);
    }

    #[test]
    fn test_outcome_reply_text() {
        let outcome = SubmitOutcome::Fallback {
            reply: "glitch".to_string(),
            speech: SpeechOutcome::Skipped,
        };
        assert_eq!(outcome.reply(), Some("glitch"));
        assert_eq!(SubmitOutcome::Busy.reply(), None);
    }
}
