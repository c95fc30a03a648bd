//! Upstream providers used by the gateway
//!
//! The gateway holds the API keys and forwards to these. Each one sits
//! behind a trait so the HTTP handlers can be exercised with fakes.

mod chat;

use async_trait::async_trait;

use crate::Result;
use crate::conversation::Turn;
use crate::voice::CatalogVoice;

pub use chat::ChatCompletionsClient;

/// Chat completion backend
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Complete a conversation and return the assistant's reply
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Gateway`] carrying the upstream status when the
    /// provider rejects the request, other errors on transport failure
    async fn complete(&self, messages: &[Turn]) -> Result<String>;

    /// Provider name for logs
    fn name(&self) -> &'static str;
}

/// Cloud speech synthesis backend
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize MP3 audio for `text` in `voice`
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    async fn synthesize(&self, text: &str, voice: &CatalogVoice) -> Result<Vec<u8>>;
}
