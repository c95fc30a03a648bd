//! Speech-to-text (STT) processing

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

const WHISPER_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Turns a WAV recording into text
///
/// Implemented by the Whisper client on the gateway side and by the HTTP
/// gateway client on the terminal side.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe WAV audio bytes
    ///
    /// # Errors
    ///
    /// Returns error if transcription fails
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String>;
}

/// Response from `OpenAI` Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Transcribes speech with `OpenAI` Whisper
pub struct WhisperTranscriber {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    language: Option<String>,
}

impl WhisperTranscriber {
    /// Create a Whisper client
    #[must_use]
    pub fn new(api_key: SecretString, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            language: None,
        }
    }

    /// Hint the spoken language (BCP-47 tags like `en-US` are reduced to `en`)
    #[must_use]
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = whisper_language(language);
        self
    }

    async fn request(&self, wav: Vec<u8>) -> Result<String> {
        tracing::debug!(audio_bytes = wav.len(), "starting Whisper transcription");

        let mut form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(wav)
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());
        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }

        let response = self
            .client
            .post(WHISPER_URL)
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await?;
        tracing::debug!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String> {
        self.request(wav).await
    }
}

/// Whisper takes ISO-639-1 codes only
fn whisper_language(tag: &str) -> Option<String> {
    let primary = tag.split(['-', '_']).next()?.trim().to_ascii_lowercase();
    (primary.len() == 2).then_some(primary)
}
