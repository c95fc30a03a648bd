//! Speech gateway endpoint
//!
//! Always answers `200 audio/mpeg`. When there is nothing to say, no key, or
//! the provider fails, the body is empty and the client falls back to local
//! synthesis.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::post,
};

use super::{ApiState, FUNCTIONS_PREFIX, parse_body};
use crate::gateway::SpeechRequest;
use crate::voice::catalog;

/// Build TTS router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/tts", post(tts))
        .route(&format!("{FUNCTIONS_PREFIX}/tts"), post(tts))
        .with_state(state)
}

async fn tts(State(state): State<Arc<ApiState>>, body: Bytes) -> Response {
    let audio = render(&state, &body).await;
    ([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response()
}

async fn render(state: &ApiState, body: &[u8]) -> Vec<u8> {
    let Some(provider) = &state.speech else {
        tracing::debug!("no TTS provider configured");
        return Vec::new();
    };

    let request: SpeechRequest = match parse_body(body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "malformed TTS request");
            return Vec::new();
        }
    };
    if request.text.is_empty() {
        return Vec::new();
    }

    let voice = catalog::resolve(request.voice.as_deref());
    match provider.synthesize(&request.text, voice).await {
        Ok(audio) => {
            tracing::debug!(voice = voice.name, bytes = audio.len(), "speech synthesized");
            audio
        }
        Err(e) => {
            tracing::error!(error = %e, voice = voice.name, "speech synthesis failed");
            Vec::new()
        }
    }
}
