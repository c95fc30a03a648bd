//! OpenAI-compatible chat completions (Groq by default)

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::ChatProvider;
use crate::conversation::Turn;
use crate::{Error, Result};

/// Reply used when the provider returns no content
pub const EMPTY_COMPLETION: &str = "…";

/// Chat completions client for any OpenAI-compatible endpoint
pub struct ChatCompletionsClient {
    client: Client,
    url: String,
    api_key: SecretString,
    model: String,
    temperature: f32,
}

impl ChatCompletionsClient {
    /// Create a client
    #[must_use]
    pub fn new(url: String, api_key: SecretString, model: String, temperature: f32) -> Self {
        Self {
            client: Client::new(),
            url,
            api_key,
            model,
            temperature,
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn first_content(response: ChatCompletionResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| EMPTY_COMPLETION.to_string())
}

#[async_trait]
impl ChatProvider for ChatCompletionsClient {
    async fn complete(&self, messages: &[Turn]) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        tracing::debug!(model = %self.model, messages = messages.len(), "requesting completion");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Completion(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "completion provider rejected request");
            return Err(Error::Gateway {
                status: status.as_u16(),
                body,
            });
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Completion(format!("failed to parse response: {e}")))?;

        Ok(first_content(result))
    }

    fn name(&self) -> &'static str {
        "chat-completions"
    }
}
