//! Error types for the FRIDAY gateway

use thiserror::Error;

/// Result type alias for FRIDAY operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the FRIDAY gateway and client
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device or decoding error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// On-device speech synthesis error
    #[error("local synthesis error: {0}")]
    Synthesis(String),

    /// No speech recognizer available on this platform
    #[error("speech recognition not supported here: {0}")]
    RecognizerUnavailable(String),

    /// Upstream completion provider error
    #[error("completion error: {0}")]
    Completion(String),

    /// Gateway responded with a non-success status
    #[error("gateway returned {status}: {body}")]
    Gateway { status: u16, body: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
