//! HTTP client for the completion, speech, and transcription gateways

use std::time::Duration;

use async_trait::async_trait;

use super::{
    CompletionGateway, CompletionRequest, ErrorBody, SpeechGateway, SpeechRequest,
    SynthesisResult, TranscriptionReply,
};
use crate::voice::Transcriber;
use crate::{Error, Result};

/// Talks to a running `friday serve` (or any host exposing the same routes)
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a client for the gateway at `base_url`
    ///
    /// Every request is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Gateway base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Turn a non-success response into [`Error::Gateway`]
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ErrorBody>(&text).map_or(text, |b| b.error);
        Err(Error::Gateway {
            status: status.as_u16(),
            body,
        })
    }
}

#[derive(serde::Deserialize)]
struct ReplyBody {
    #[serde(default)]
    reply: Option<String>,
}

#[async_trait]
impl CompletionGateway for HttpGateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        tracing::debug!(history = request.history.len(), "requesting completion");

        let response = self
            .client
            .post(self.url("chat"))
            .json(request)
            .send()
            .await?;
        let body: ReplyBody = Self::check(response).await?.json().await?;

        Ok(body.reply.unwrap_or_default())
    }
}

#[async_trait]
impl SpeechGateway for HttpGateway {
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<SynthesisResult> {
        let request = SpeechRequest {
            text: text.to_string(),
            voice: voice.map(ToString::to_string),
        };

        let response = self
            .client
            .post(self.url("tts"))
            .json(&request)
            .send()
            .await?;
        let audio = Self::check(response).await?.bytes().await?;

        tracing::debug!(bytes = audio.len(), "speech gateway responded");
        Ok(SynthesisResult::from_body(audio.to_vec()))
    }
}

#[async_trait]
impl Transcriber for HttpGateway {
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String> {
        let response = self
            .client
            .post(self.url("transcribe"))
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(wav)
            .send()
            .await?;
        let body: TranscriptionReply = Self::check(response).await?.json().await?;

        Ok(body.text)
    }
}
