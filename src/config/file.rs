//! TOML configuration file loading
//!
//! Supports `~/.config/friday/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FridayConfigFile {
    /// Path to a persona JSON file replacing the embedded FRIDAY persona
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_file: Option<String>,

    /// LLM configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Speech provider configuration
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Gateway server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Terminal client configuration
    #[serde(default)]
    pub client: ClientFileConfig,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LlmFileConfig {
    /// OpenAI-compatible chat completions URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Model identifier (e.g. "llama-3.1-8b-instant")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Speech provider configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SpeechFileConfig {
    /// Cloud TTS provider ("elevenlabs" or "openai")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Provider model override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Whisper model used by the microphone recognizer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stt_model: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiKeysFileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groq: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevenlabs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai: Option<String>,
}

/// Server configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerFileConfig {
    /// Gateway port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Static web UI directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<String>,
}

/// Terminal client configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ClientFileConfig {
    /// Base URL of the gateway the client talks to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_url: Option<String>,

    /// Request timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Speak replies aloud
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speak: Option<bool>,

    /// Prefer cloud synthesis over local synthesis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_tts: Option<bool>,

    /// Voice name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

/// Parse configuration file contents
///
/// # Errors
///
/// Returns error if the content is not valid TOML for this schema
pub fn parse_config_file(content: &str) -> crate::Result<FridayConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load the TOML config file from the standard path
///
/// Returns `FridayConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> FridayConfigFile {
    let Some(path) = config_file_path() else {
        return FridayConfigFile::default();
    };

    if !path.exists() {
        return FridayConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                FridayConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            FridayConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/friday/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("friday").join("config.toml"))
}

/// Write the config file to the standard path, creating parent directories
///
/// # Errors
///
/// Returns error if no config directory exists or the file cannot be written
pub fn write_config_file(config: &FridayConfigFile) -> crate::Result<PathBuf> {
    let path = config_file_path()
        .ok_or_else(|| crate::Error::Config("no config directory on this platform".to_string()))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml = toml::to_string_pretty(config)
        .map_err(|e| crate::Error::Config(format!("failed to encode config: {e}")))?;
    std::fs::write(&path, toml)?;
    Ok(path)
}
