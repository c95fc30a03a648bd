//! Rolling conversation log persisted under a single storage key

use std::sync::Arc;

use super::Turn;
use crate::db::StateStorage;

/// Storage key holding the persisted conversation window
pub const CONVERSATION_KEY: &str = "convo";

/// Number of most recent turns kept in durable storage
pub const MAX_PERSISTED_TURNS: usize = 12;

/// In-memory conversation log with a bounded persisted window
///
/// The in-memory log grows for the lifetime of the session; only the last
/// [`MAX_PERSISTED_TURNS`] turns are written out, so a reload starts from
/// that window. Storage failures are logged and never reach the caller.
pub struct ConversationStore {
    turns: Vec<Turn>,
    storage: Arc<dyn StateStorage>,
}

impl ConversationStore {
    /// Load the persisted window from storage
    ///
    /// An absent or unparseable value yields an empty conversation.
    #[must_use]
    pub fn load(storage: Arc<dyn StateStorage>) -> Self {
        let turns = match storage.get(CONVERSATION_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<Turn>>(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "persisted conversation is corrupt, starting empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted conversation");
                Vec::new()
            }
        };

        tracing::debug!(turns = turns.len(), "conversation loaded");
        Self { turns, storage }
    }

    /// Append a turn to the end of the log
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Write the most recent window to storage, replacing any prior value
    pub fn persist(&self) {
        let window = self.window();
        let encoded = match serde_json::to_string(window) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode conversation");
                return;
            }
        };

        if let Err(e) = self.storage.set(CONVERSATION_KEY, &encoded) {
            tracing::warn!(error = %e, "failed to persist conversation");
        } else {
            tracing::trace!(turns = window.len(), "conversation persisted");
        }
    }

    /// Drop every turn and persist the empty window
    pub fn clear(&mut self) {
        self.turns.clear();
        self.persist();
    }

    /// All turns currently held in memory, oldest first
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The turns that [`persist`](Self::persist) writes out
    #[must_use]
    pub fn window(&self) -> &[Turn] {
        let start = self.turns.len().saturating_sub(MAX_PERSISTED_TURNS);
        &self.turns[start..]
    }

    /// Number of turns in memory
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the conversation has no turns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
