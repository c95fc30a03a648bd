//! Configuration management for the FRIDAY gateway and client
//!
//! Every value is layered env > TOML file > default.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::voice::TtsProvider;
use crate::{Persona, Result};

/// Default Groq chat completions endpoint
pub const DEFAULT_LLM_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default chat model
pub const DEFAULT_LLM_MODEL: &str = "llama-3.1-8b-instant";

/// Default gateway port
pub const DEFAULT_PORT: u16 = 8888;

/// FRIDAY configuration
#[derive(Debug)]
pub struct Config {
    /// Active persona
    pub persona: Persona,

    /// Path to data directory (conversation database)
    pub data_dir: PathBuf,

    /// API keys
    pub api_keys: ApiKeys,

    /// Gateway server configuration
    pub server: ServerConfig,

    /// Completion provider configuration
    pub llm: LlmConfig,

    /// Speech provider configuration
    pub speech: SpeechConfig,

    /// Terminal client configuration
    pub client: ClientConfig,
}

/// API keys for external services
///
/// Held by the gateway only; the client never sees them.
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// Groq API key (chat completions)
    pub groq: Option<SecretString>,

    /// `ElevenLabs` API key (cloud TTS)
    pub elevenlabs: Option<SecretString>,

    /// `OpenAI` API key (TTS variant and Whisper transcription)
    pub openai: Option<SecretString>,
}

/// Gateway server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Path to static files directory (web UI)
    pub static_dir: Option<PathBuf>,
}

/// Completion provider configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// OpenAI-compatible chat completions URL
    pub url: String,

    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,
}

/// Speech provider configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Cloud TTS provider used by the speech gateway
    pub provider: TtsProvider,

    /// Model override for the TTS provider
    pub model: Option<String>,

    /// Whisper model for microphone transcription
    pub stt_model: String,
}

/// Terminal client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the gateway
    pub gateway_url: String,

    /// Timeout applied to every gateway request
    pub timeout: Duration,

    /// Speech preferences
    pub preferences: SpeechPreferences,
}

/// User-facing speech toggles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechPreferences {
    /// Speak replies at all
    pub speak: bool,

    /// Use cloud synthesis (falls back to local on failure)
    pub cloud_tts: bool,

    /// Voice name; cloud catalog name or local voice name
    pub voice: Option<String>,
}

impl Default for SpeechPreferences {
    fn default() -> Self {
        Self {
            speak: true,
            cloud_tts: true,
            voice: None,
        }
    }
}

/// Default data directory (`~/.local/share/friday` on Linux)
#[must_use]
pub fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("friday"))
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if a configured persona file cannot be loaded
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        let config = Self::from_sources(fc, |key| std::env::var(key).ok())?;

        std::fs::create_dir_all(&config.data_dir).ok();
        Ok(config)
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a configured persona file cannot be loaded
    pub fn from_sources(
        fc: file::FridayConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        // Persona (env > toml > embedded)
        let persona = match env("FRIDAY_PERSONA_FILE").or(fc.persona_file) {
            Some(path) => Persona::from_file(&PathBuf::from(path))?,
            None => Persona::friday(),
        };

        // API keys (env > toml > None)
        let api_keys = ApiKeys {
            groq: env("GROQ_API_KEY")
                .or(fc.api_keys.groq)
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
            elevenlabs: env("ELEVENLABS_API_KEY")
                .or(fc.api_keys.elevenlabs)
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
            openai: env("OPENAI_API_KEY")
                .or(fc.api_keys.openai)
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
        };

        let server = ServerConfig {
            port: env("FRIDAY_PORT")
                .or_else(|| env("PORT"))
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            static_dir: env("FRIDAY_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
        };

        let llm = LlmConfig {
            url: env("FRIDAY_LLM_URL")
                .or(fc.llm.url)
                .unwrap_or_else(|| DEFAULT_LLM_URL.to_string()),
            model: env("FRIDAY_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            temperature: fc.llm.temperature.unwrap_or(0.7),
        };

        let provider = match env("FRIDAY_TTS_PROVIDER").or(fc.speech.provider) {
            Some(name) => name.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "unknown TTS provider, using ElevenLabs");
                TtsProvider::ElevenLabs
            }),
            None => TtsProvider::ElevenLabs,
        };
        let speech = SpeechConfig {
            provider,
            model: env("FRIDAY_TTS_MODEL").or(fc.speech.model),
            stt_model: env("FRIDAY_STT_MODEL")
                .or(fc.speech.stt_model)
                .unwrap_or_else(|| "whisper-1".to_string()),
        };

        // Voice preference (env > toml > persona)
        let voice = env("FRIDAY_VOICE")
            .or(fc.client.voice)
            .or_else(|| persona.tts_voice().map(ToString::to_string));
        let client = ClientConfig {
            gateway_url: env("FRIDAY_GATEWAY_URL")
                .or(fc.client.gateway_url)
                .unwrap_or_else(|| format!("http://localhost:{}", server.port)),
            timeout: Duration::from_secs(
                env("FRIDAY_HTTP_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .or(fc.client.timeout_secs)
                    .unwrap_or(60),
            ),
            preferences: SpeechPreferences {
                speak: env("FRIDAY_SPEAK")
                    .map(|v| parse_flag(&v))
                    .or(fc.client.speak)
                    .unwrap_or(true),
                cloud_tts: env("FRIDAY_CLOUD_TTS")
                    .map(|v| parse_flag(&v))
                    .or(fc.client.cloud_tts)
                    .unwrap_or(true),
                voice,
            },
        };

        let data_dir = env("FRIDAY_DATA_DIR").map_or_else(default_data_dir, PathBuf::from);

        Ok(Self {
            persona,
            data_dir,
            api_keys,
            server,
            llm,
            speech,
            client,
        })
    }

    /// Path of the local state database
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("friday.db")
    }
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
