//! Assistant persona: identity, system prompt and fixed phrases
//!
//! Follows the persona.json layout: identity, voice and personality
//! sections. The FRIDAY persona is compiled in; a JSON file can replace it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Embedded default persona
const EMBEDDED_FRIDAY: &str = include_str!("../personas/friday.json");

/// Greeting used when a persona file does not define one
const DEFAULT_GREETING: &str = "Hello. Welcome back!";

/// Fallback reply used when a persona file does not define one
const DEFAULT_FALLBACK_REPLY: &str = "Sorry, my uplink just glitched.";

/// A persona defines who the assistant is
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    /// Semantic version of this persona file
    pub version: String,

    /// Core identity (required)
    pub identity: Identity,

    /// Voice configuration
    pub voice: Option<Voice>,

    /// Behavior and fixed phrases
    pub personality: Option<Personality>,
}

/// Core identity of the assistant
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Short descriptive phrase
    pub tagline: Option<String>,

    /// Longer description
    pub description: Option<String>,
}

/// Voice configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    /// Text-to-speech configuration
    pub tts: Option<TtsConfig>,

    /// Speech-to-text configuration
    pub stt: Option<SttConfig>,
}

/// TTS configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsConfig {
    /// Voice name (cloud catalog name or local voice name)
    pub voice: Option<String>,
}

/// STT configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SttConfig {
    /// Primary language (BCP 47 code)
    pub language: Option<String>,
}

/// Behavior and fixed phrases
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Personality {
    /// Base system prompt sent with every completion request
    pub system_prompt: Option<String>,

    /// Spoken on first run, when there is no conversation history
    pub greeting: Option<String>,

    /// Shown and spoken when the completion gateway fails
    pub fallback_reply: Option<String>,
}

impl Persona {
    /// The compiled-in FRIDAY persona
    ///
    /// # Panics
    ///
    /// Never in practice: the embedded JSON is covered by tests.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn friday() -> Self {
        serde_json::from_str(EMBEDDED_FRIDAY).expect("embedded persona is valid JSON")
    }

    /// Load a persona from a JSON file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let persona: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid persona {}: {e}", path.display())))?;
        tracing::info!(persona = %persona.identity.id, path = %path.display(), "loaded persona file");
        Ok(persona)
    }

    /// Get the unique identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.identity.id
    }

    /// Get the display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Get the system prompt
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        self.personality
            .as_ref()
            .and_then(|p| p.system_prompt.as_deref())
            .unwrap_or_default()
    }

    /// Get the first-run greeting
    #[must_use]
    pub fn greeting(&self) -> &str {
        self.personality
            .as_ref()
            .and_then(|p| p.greeting.as_deref())
            .unwrap_or(DEFAULT_GREETING)
    }

    /// Get the reply used when the completion gateway fails
    #[must_use]
    pub fn fallback_reply(&self) -> &str {
        self.personality
            .as_ref()
            .and_then(|p| p.fallback_reply.as_deref())
            .unwrap_or(DEFAULT_FALLBACK_REPLY)
    }

    /// Get the preferred TTS voice name
    #[must_use]
    pub fn tts_voice(&self) -> Option<&str> {
        self.voice.as_ref()?.tts.as_ref()?.voice.as_deref()
    }

    /// Get the recognition language
    #[must_use]
    pub fn stt_language(&self) -> Option<&str> {
        self.voice.as_ref()?.stt.as_ref()?.language.as_deref()
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::friday()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_friday_parses() {
        let persona = Persona::friday();
        assert_eq!(persona.id(), "friday");
        assert_eq!(persona.name(), "FRIDAY");
        assert_eq!(persona.greeting(), "Hello, Peter. Welcome back!");
        assert_eq!(persona.fallback_reply(), "Sorry Peter, my uplink just glitched.");
        assert_eq!(persona.tts_voice(), Some("rachel"));
        assert!(persona.system_prompt().contains("FRIDAY"));
    }

    #[test]
    fn test_missing_personality_uses_defaults() {
        let persona: Persona = serde_json::from_str(
            r#"{"version":"1.0.0","identity":{"id":"bare","name":"Bare"}}"#,
        )
        .unwrap();

        assert_eq!(persona.system_prompt(), "");
        assert_eq!(persona.greeting(), DEFAULT_GREETING);
        assert_eq!(persona.fallback_reply(), DEFAULT_FALLBACK_REPLY);
        assert!(persona.tts_voice().is_none());
    }

    #[test]
    fn test_from_file_reports_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();

        let err = Persona::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
