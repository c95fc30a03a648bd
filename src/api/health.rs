//! Health check endpoint

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub persona_id: String,
    pub capabilities: Capabilities,
}

/// Which upstream providers are configured
#[derive(Serialize)]
pub struct Capabilities {
    pub chat: bool,
    pub tts: bool,
    pub stt: bool,
}

/// Liveness probe with provider availability
async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        persona_id: state.persona_id.clone(),
        capabilities: Capabilities {
            chat: state.chat.is_some(),
            tts: state.speech.is_some(),
            stt: state.transcriber.is_some(),
        },
    })
}

/// Build health router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}
