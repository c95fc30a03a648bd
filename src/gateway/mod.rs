//! Client side of the gateway
//!
//! The completion and speech gateways hold the provider credentials; the
//! client only ever talks to them over HTTP. Both calls sit behind traits
//! so the session can run against fakes.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::conversation::Turn;

pub use http::HttpGateway;

/// Body of a completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Persona system instructions
    #[serde(default)]
    pub system: String,

    /// Prior turns, oldest first
    #[serde(default)]
    pub history: Vec<Turn>,

    /// New user utterance
    #[serde(default)]
    pub user: String,
}

/// Successful completion response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReply {
    /// Assistant reply text
    pub reply: String,
}

/// Error body returned by both gateways
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error
    pub error: String,
}

/// Body of a speech synthesis request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// Text to speak
    #[serde(default)]
    pub text: String,

    /// Catalog voice name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

/// Result of a transcription request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionReply {
    /// Recognized text
    pub text: String,
}

/// Outcome of a speech gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisResult {
    /// MP3 audio to play
    Audio(Vec<u8>),
    /// The gateway answered but produced no audio (missing key, provider error)
    NoAudio,
}

impl SynthesisResult {
    /// Classify a response body
    #[must_use]
    pub fn from_body(body: Vec<u8>) -> Self {
        if body.is_empty() {
            Self::NoAudio
        } else {
            Self::Audio(body)
        }
    }
}

/// Produces assistant replies
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Request a reply for the given conversation
    ///
    /// The returned text is the raw `reply` field; normalization is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout, or a non-success status
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Produces spoken audio
#[async_trait]
pub trait SpeechGateway: Send + Sync {
    /// Synthesize `text` with an optional catalog voice
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout, or a non-success status
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<SynthesisResult>;
}
