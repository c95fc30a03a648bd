//! HTTP gateway for the FRIDAY client
//!
//! Holds the provider credentials and exposes the completion, speech, and
//! transcription endpoints the client calls. Every route is also mounted
//! under `/.netlify/functions/` so existing web front-ends keep working.

mod cors;
pub mod chat;
pub mod health;
pub mod tts;
pub mod voice;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use serde::de::DeserializeOwned;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::providers::{ChatCompletionsClient, ChatProvider, SpeechProvider};
use crate::voice::{TextToSpeech, Transcriber, TtsProvider, WhisperTranscriber};
use crate::{Config, Result};

/// Prefix used by serverless deployments of the same endpoints
pub const FUNCTIONS_PREFIX: &str = "/.netlify/functions";

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub persona_id: String,
    /// Chat completion backend; `None` when no key is configured
    pub chat: Option<Arc<dyn ChatProvider>>,
    /// Cloud TTS backend; `None` when no key is configured
    pub speech: Option<Arc<dyn SpeechProvider>>,
    /// Transcription backend; `None` when no key is configured
    pub transcriber: Option<Arc<dyn Transcriber>>,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    port: u16,
    persona_id: String,
    chat: Option<Arc<dyn ChatProvider>>,
    speech: Option<Arc<dyn SpeechProvider>>,
    transcriber: Option<Arc<dyn Transcriber>>,
    static_dir: Option<PathBuf>,
}

impl ApiServerBuilder {
    /// Create a new API server builder with no providers
    #[must_use]
    pub fn new(port: u16) -> Self {
        Self {
            port,
            persona_id: "friday".to_string(),
            chat: None,
            speech: None,
            transcriber: None,
            static_dir: None,
        }
    }

    /// Wire up every provider whose key is present in `config`
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::new(config.server.port)
            .persona_id(config.persona.id().to_string())
            .static_dir(config.server.static_dir.clone());

        if let Some(key) = &config.api_keys.groq {
            builder = builder.chat(Arc::new(ChatCompletionsClient::new(
                config.llm.url.clone(),
                key.clone(),
                config.llm.model.clone(),
                config.llm.temperature,
            )));
        } else {
            tracing::warn!("GROQ_API_KEY not set, chat endpoint will fail");
        }

        let tts_key = match config.speech.provider {
            TtsProvider::ElevenLabs => config.api_keys.elevenlabs.clone(),
            TtsProvider::OpenAi => config.api_keys.openai.clone(),
        };
        if let Some(key) = tts_key {
            builder = builder.speech(Arc::new(TextToSpeech::new(
                config.speech.provider,
                key,
                config.speech.model.clone(),
            )));
        } else {
            tracing::warn!(provider = %config.speech.provider, "no TTS key set, speech endpoint returns empty audio");
        }

        if let Some(key) = &config.api_keys.openai {
            let mut whisper = WhisperTranscriber::new(key.clone(), config.speech.stt_model.clone());
            if let Some(language) = config.persona.stt_language() {
                whisper = whisper.with_language(language);
            }
            builder = builder.transcriber(Arc::new(whisper));
        }

        builder
    }

    /// Set the persona id reported by the health endpoint
    #[must_use]
    pub fn persona_id(mut self, id: String) -> Self {
        self.persona_id = id;
        self
    }

    /// Set the chat completion backend
    #[must_use]
    pub fn chat(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        self.chat = Some(provider);
        self
    }

    /// Set the cloud TTS backend
    #[must_use]
    pub fn speech(mut self, provider: Arc<dyn SpeechProvider>) -> Self {
        self.speech = Some(provider);
        self
    }

    /// Set the transcription backend
    #[must_use]
    pub fn transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// Set the static files directory for serving a web UI
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        let state = Arc::new(ApiState {
            persona_id: self.persona_id,
            chat: self.chat,
            speech: self.speech,
            transcriber: self.transcriber,
        });

        ApiServer {
            state,
            port: self.port,
            static_dir: self.static_dir,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(chat::router(self.state.clone()))
            .merge(tts::router(self.state.clone()))
            .merge(voice::router(self.state.clone()))
            .merge(health::router(self.state.clone()));

        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir =
                ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        router
            .layer(axum::middleware::from_fn(cors::cors))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "gateway listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

/// Parse a JSON request body, treating an empty body as `{}`
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> serde_json::Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_str("{}")
    } else {
        serde_json::from_slice(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SpeechRequest;

    #[test]
    fn test_empty_body_parses_as_empty_object() {
        let request: SpeechRequest = parse_body(b"").unwrap();
        assert!(request.text.is_empty());
        assert!(request.voice.is_none());
    }

    #[test]
    fn test_malformed_body_is_an_error() {
        assert!(parse_body::<SpeechRequest>(b"{nope").is_err());
    }

    #[test]
    fn test_builder_without_keys_has_no_providers() {
        let server = ApiServerBuilder::new(0).build();
        assert!(server.state.chat.is_none());
        assert!(server.state.speech.is_none());
        assert!(server.state.transcriber.is_none());
    }
}
