//! Cloud text-to-speech (TTS) providers

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::catalog::CatalogVoice;
use crate::providers::SpeechProvider;
use crate::{Error, Result};

const ELEVENLABS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";
const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// TTS provider backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TtsProvider {
    /// `ElevenLabs` multilingual voices
    ElevenLabs,
    /// `OpenAI` speech endpoint
    OpenAi,
}

impl TtsProvider {
    /// Model used when none is configured
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::ElevenLabs => "eleven_multilingual_v2",
            Self::OpenAi => "tts-1",
        }
    }
}

impl fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ElevenLabs => f.write_str("elevenlabs"),
            Self::OpenAi => f.write_str("openai"),
        }
    }
}

impl FromStr for TtsProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "elevenlabs" | "eleven_labs" | "11labs" => Ok(Self::ElevenLabs),
            "openai" => Ok(Self::OpenAi),
            other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
        }
    }
}

/// Synthesizes MP3 speech through a cloud provider
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Create a TTS client for the given provider
    ///
    /// Uses the provider's default model when `model` is `None`.
    #[must_use]
    pub fn new(provider: TtsProvider, api_key: SecretString, model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.unwrap_or_else(|| provider.default_model().to_string()),
            provider,
        }
    }

    /// Provider this client talks to
    #[must_use]
    pub const fn provider(&self) -> TtsProvider {
        self.provider
    }

    /// Synthesize text with a catalog voice
    ///
    /// # Returns
    ///
    /// Audio bytes (MP3 format)
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the provider rejects it
    pub async fn synthesize(&self, text: &str, voice: &CatalogVoice) -> Result<Vec<u8>> {
        tracing::debug!(
            provider = %self.provider,
            voice = voice.name,
            chars = text.len(),
            "synthesizing speech"
        );

        match self.provider {
            TtsProvider::ElevenLabs => self.synthesize_elevenlabs(text, voice).await,
            TtsProvider::OpenAi => self.synthesize_openai(text, voice).await,
        }
    }

    async fn synthesize_elevenlabs(&self, text: &str, voice: &CatalogVoice) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct VoiceSettings {
            stability: f32,
            similarity_boost: f32,
        }

        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
            voice_settings: VoiceSettings,
        }

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.8,
            },
        };

        let response = self
            .client
            .post(format!("{ELEVENLABS_URL}/{}", voice.elevenlabs_id))
            .header("xi-api-key", self.api_key.expose_secret())
            .header("Accept", "audio/mpeg")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn synthesize_openai(&self, text: &str, voice: &CatalogVoice) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct OpenAiRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            response_format: &'a str,
        }

        let request = OpenAiRequest {
            model: &self.model,
            input: text,
            voice: voice.openai_voice,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(OPENAI_SPEECH_URL)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl SpeechProvider for TextToSpeech {
    async fn synthesize(&self, text: &str, voice: &CatalogVoice) -> Result<Vec<u8>> {
        Self::synthesize(self, text, voice).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("ElevenLabs".parse::<TtsProvider>().unwrap(), TtsProvider::ElevenLabs);
        assert_eq!("11labs".parse::<TtsProvider>().unwrap(), TtsProvider::ElevenLabs);
        assert_eq!(" openai ".parse::<TtsProvider>().unwrap(), TtsProvider::OpenAi);
        assert!("polly".parse::<TtsProvider>().is_err());
    }

    #[test]
    fn test_default_models() {
        let tts = TextToSpeech::new(TtsProvider::ElevenLabs, SecretString::from("k"), None);
        assert_eq!(tts.model, "eleven_multilingual_v2");

        let tts = TextToSpeech::new(
            TtsProvider::OpenAi,
            SecretString::from("k"),
            Some("tts-1-hd".to_string()),
        );
        assert_eq!(tts.model, "tts-1-hd");
        assert_eq!(tts.provider(), TtsProvider::OpenAi);
    }
}
