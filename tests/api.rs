//! Gateway API integration tests

mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use tower::ServiceExt;

use friday_gateway::api::ApiServerBuilder;
use friday_gateway::voice::catalog;

use common::{FakeChat, FakeSpeech, FakeTranscriber};

/// Router with no upstream providers configured
fn build_test_router() -> Router {
    ApiServerBuilder::new(0).build().router()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["persona_id"], "friday");
    assert_eq!(json["capabilities"]["chat"], false);
    assert_eq!(json["capabilities"]["tts"], false);
    assert_eq!(json["capabilities"]["stt"], false);
}

#[tokio::test]
async fn test_health_reports_configured_providers() {
    let app = ApiServerBuilder::new(0)
        .chat(Arc::new(FakeChat::answering("hi")))
        .transcriber(Arc::new(FakeTranscriber("hello".to_string())))
        .build()
        .router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["capabilities"]["chat"], true);
    assert_eq!(json["capabilities"]["tts"], false);
    assert_eq!(json["capabilities"]["stt"], true);
}

#[tokio::test]
async fn test_chat_without_user_text_is_bad_request() {
    let chat = Arc::new(FakeChat::answering("unused"));
    let app = ApiServerBuilder::new(0).chat(chat.clone()).build().router();

    let response = app
        .oneshot(post_json("/chat", r#"{"system":"be brief","history":[]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Missing user text");
    assert!(chat.seen().is_empty());
}

#[tokio::test]
async fn test_chat_empty_body_is_bad_request() {
    let app = ApiServerBuilder::new(0)
        .chat(Arc::new(FakeChat::answering("unused")))
        .build()
        .router();

    let response = app.oneshot(post_json("/chat", "")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_returns_reply_and_forwards_messages() {
    let chat = Arc::new(FakeChat::answering("Sunny, sir."));
    let app = ApiServerBuilder::new(0).chat(chat.clone()).build().router();

    let body = r#"{
        "system": "You are FRIDAY.",
        "history": [{"role": "assistant", "content": "Hello, Peter. Welcome back!"}],
        "user": "What is the weather"
    }"#;
    let response = app.oneshot(post_json("/chat", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["reply"], "Sunny, sir.");

    let seen = chat.seen();
    assert_eq!(seen.len(), 1);
    let roles: Vec<&str> = seen[0].iter().map(|t| t.role.as_str()).collect();
    assert_eq!(roles, ["system", "assistant", "user"]);
    assert_eq!(seen[0][2].content, "What is the weather");
}

#[tokio::test]
async fn test_chat_upstream_status_passes_through() {
    let app = ApiServerBuilder::new(0)
        .chat(Arc::new(FakeChat::rejecting(429, "rate limited")))
        .build()
        .router();

    let response = app
        .oneshot(post_json("/chat", r#"{"user":"hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(response).await;
    assert_eq!(json["error"], "rate limited");
}

#[tokio::test]
async fn test_chat_without_provider_is_server_error() {
    let app = build_test_router();

    let response = app
        .oneshot(post_json("/chat", r#"{"user":"hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_chat_malformed_json_is_server_error() {
    let app = ApiServerBuilder::new(0)
        .chat(Arc::new(FakeChat::answering("unused")))
        .build()
        .router();

    let response = app.oneshot(post_json("/chat", "{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_functions_prefix_alias() {
    let app = ApiServerBuilder::new(0)
        .chat(Arc::new(FakeChat::answering("aliased")))
        .build()
        .router();

    let response = app
        .oneshot(post_json("/.netlify/functions/chat", r#"{"user":"hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["reply"], "aliased");
}

#[tokio::test]
async fn test_preflight_returns_no_content_with_cors_headers() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/tts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_METHODS],
        "GET, POST, OPTIONS"
    );
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "Content-Type, Authorization"
    );
}

#[tokio::test]
async fn test_error_responses_carry_cors_headers() {
    let app = build_test_router();

    let response = app.oneshot(post_json("/chat", "{}")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_tts_without_provider_returns_empty_audio() {
    let app = build_test_router();

    let response = app
        .oneshot(post_json("/tts", r#"{"text":"hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_tts_empty_text_skips_provider() {
    let speech = Arc::new(FakeSpeech::returning(b"mp3"));
    let app = ApiServerBuilder::new(0)
        .speech(speech.clone())
        .build()
        .router();

    let response = app.oneshot(post_json("/tts", r#"{"text":""}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());
    assert!(speech.voices().is_empty());
}

#[tokio::test]
async fn test_tts_provider_failure_returns_empty_audio() {
    let app = ApiServerBuilder::new(0)
        .speech(Arc::new(FakeSpeech::failing()))
        .build()
        .router();

    let response = app
        .oneshot(post_json("/tts", r#"{"text":"hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_tts_resolves_catalog_voice() {
    let speech = Arc::new(FakeSpeech::returning(b"ID3audio"));
    let app = ApiServerBuilder::new(0)
        .speech(speech.clone())
        .build()
        .router();

    let response = app
        .clone()
        .oneshot(post_json("/tts", r#"{"text":"hello","voice":"BELLA"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ID3audio");

    // Unknown names fall back to the default voice
    let response = app
        .oneshot(post_json("/tts", r#"{"text":"hello","voice":"nobody"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bella = catalog::find("bella").unwrap();
    let rachel = catalog::find(catalog::DEFAULT_VOICE).unwrap();
    assert_eq!(speech.voices(), [bella.elevenlabs_id, rachel.elevenlabs_id]);
}

#[tokio::test]
async fn test_transcribe_without_provider_is_unavailable() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/transcribe")
                .header(header::CONTENT_TYPE, "audio/wav")
                .body(Body::from(vec![1_u8, 2, 3]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_transcribe_empty_audio_is_bad_request() {
    let app = ApiServerBuilder::new(0)
        .transcriber(Arc::new(FakeTranscriber("unused".to_string())))
        .build()
        .router();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/transcribe")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Empty audio data");
}

#[tokio::test]
async fn test_transcribe_returns_text() {
    let app = ApiServerBuilder::new(0)
        .transcriber(Arc::new(FakeTranscriber("open the pod bay doors".to_string())))
        .build()
        .router();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/transcribe")
                .body(Body::from(vec![0_u8; 64]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["text"], "open the pod bay doors");
}
