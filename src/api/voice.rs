//! Transcription endpoint used by the microphone recognizer

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};

use super::{ApiState, FUNCTIONS_PREFIX};
use crate::gateway::{ErrorBody, TranscriptionReply};

/// Build voice router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/transcribe", post(transcribe))
        .route(&format!("{FUNCTIONS_PREFIX}/transcribe"), post(transcribe))
        .with_state(state)
}

/// Transcribe a WAV recording
async fn transcribe(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Result<Json<TranscriptionReply>, VoiceError> {
    let transcriber = state
        .transcriber
        .as_ref()
        .ok_or(VoiceError::NotConfigured("transcription not configured"))?;

    if body.is_empty() {
        return Err(VoiceError::BadRequest("Empty audio data"));
    }

    let text = transcriber
        .transcribe(body.to_vec())
        .await
        .map_err(|e| VoiceError::TranscriptionFailed(e.to_string()))?;

    Ok(Json(TranscriptionReply { text }))
}

/// Voice API errors
#[derive(Debug)]
pub enum VoiceError {
    NotConfigured(&'static str),
    BadRequest(&'static str),
    TranscriptionFailed(String),
}

impl IntoResponse for VoiceError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::NotConfigured(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
            Self::TranscriptionFailed(msg) => {
                tracing::error!(error = %msg, "transcription failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}
