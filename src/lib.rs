//! FRIDAY - voice chat assistant gateway and terminal client
//!
//! This library provides both halves of the assistant:
//! - The gateway: HTTP endpoints that hold provider keys and forward
//!   completions, speech synthesis, and transcription upstream
//! - The client: a conversation session with a persisted rolling log,
//!   hold-to-talk speech input, and cloud or on-device speech output
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Terminal client                     │
//! │  Session  │  Speech input  │  Speech output  │ Store │
//! └────────────────────┬────────────────────────────────┘
//!                      │ HTTP (/chat, /tts, /transcribe)
//! ┌────────────────────▼────────────────────────────────┐
//! │                  FRIDAY gateway                      │
//! │   Chat completions  │  Cloud TTS  │  Whisper         │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod conversation;
pub mod db;
pub mod error;
pub mod gateway;
pub mod persona;
pub mod providers;
pub mod session;
pub mod setup;
pub mod voice;

pub use config::Config;
pub use conversation::{ConversationStore, Role, Turn};
pub use db::{DbConn, DbPool, KvStore, MemoryStorage, StateStorage};
pub use error::{Error, Result};
pub use gateway::{CompletionGateway, HttpGateway, SpeechGateway, SynthesisResult};
pub use persona::Persona;
pub use session::{Session, Status, StatusIndicator, SubmitOutcome};
pub use voice::{SpeechInputCapture, SpeechOutcome, SpeechOutputChooser};
