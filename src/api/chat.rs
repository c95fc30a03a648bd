//! Completion gateway endpoint

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};

use super::{ApiState, FUNCTIONS_PREFIX, parse_body};
use crate::Error;
use crate::conversation::Turn;
use crate::gateway::{CompletionReply, CompletionRequest, ErrorBody};

/// Build chat router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route(&format!("{FUNCTIONS_PREFIX}/chat"), post(chat))
        .with_state(state)
}

/// Assemble the upstream message list: system, history, new user turn
fn build_messages(request: CompletionRequest) -> Vec<Turn> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    if !request.system.is_empty() {
        messages.push(Turn::system(request.system));
    }
    messages.extend(request.history);
    messages.push(Turn::user(request.user));
    messages
}

/// Forward a conversation to the completion provider
async fn chat(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Result<Json<CompletionReply>, ChatError> {
    let request: CompletionRequest =
        parse_body(&body).map_err(|e| ChatError::Internal(e.to_string()))?;
    if request.user.is_empty() {
        return Err(ChatError::MissingUser);
    }

    let provider = state
        .chat
        .as_ref()
        .ok_or_else(|| ChatError::Internal("completion provider not configured".to_string()))?;

    let messages = build_messages(request);
    tracing::debug!(provider = provider.name(), messages = messages.len(), "chat request");

    let reply = provider.complete(&messages).await.map_err(|e| match e {
        Error::Gateway { status, body } => ChatError::Upstream { status, body },
        other => ChatError::Internal(other.to_string()),
    })?;

    Ok(Json(CompletionReply { reply }))
}

/// Chat endpoint errors
#[derive(Debug)]
pub enum ChatError {
    MissingUser,
    Upstream { status: u16, body: String },
    Internal(String),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::MissingUser => (StatusCode::BAD_REQUEST, "Missing user text".to_string()),
            Self::Upstream { status, body } => {
                tracing::warn!(status, "completion provider error");
                (
                    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                    body,
                )
            }
            Self::Internal(message) => {
                tracing::error!(error = %message, "chat request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}
