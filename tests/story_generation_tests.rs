// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Story generation route tests against a mocked Gemini endpoint.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use pawquest_api::services::{DirectionsService, MediaService, SpeechService, StoryService};
use tower::ServiceExt;
use wiremock::matchers::{header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

const GEMINI_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

fn story_request_body() -> serde_json::Value {
    serde_json::json!({
        "choices": {
            "hero": "Luna",
            "companion": "a brave beagle",
            "setting": "the foggy ridge",
            "goal": "Lost Lantern",
            "tone": "calm",
            "duration_minutes": 10
        }
    })
}

fn gemini_ok_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [
            { "content": { "parts": [ { "text": text } ] } }
        ]
    })
}

async fn app_with_story_server(
    server: &MockServer,
    speech: SpeechService,
) -> (axum::Router, String) {
    let (app, state) = common::create_test_app_with_services(
        common::test_db_offline(),
        StoryService::with_base_url(Some("test-key".to_string()), server.uri()),
        speech,
        DirectionsService::new(None),
        MediaService::new(None, None, None),
    );
    let token = common::create_test_jwt("user-1", &state.config.jwt_signing_key);
    (app, token)
}

fn post_story(token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/stories")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_generate_story_returns_text_and_default_title() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(header_matcher("x-goog-api-key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(gemini_ok_body("Once upon a foggy ridge...")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (app, token) = app_with_story_server(&server, SpeechService::new(None)).await;

    let response = app
        .oneshot(post_story(&token, story_request_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["text"], "Once upon a foggy ridge...");
    assert_eq!(body["title"], "Luna and the Lost Lantern");
    // Not narrated, not saved
    assert!(body["audio"].is_null());
    assert!(body["id"].is_null());
}

#[tokio::test]
async fn test_generate_story_honors_title_override() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_ok_body("text")))
        .mount(&server)
        .await;

    let (app, token) = app_with_story_server(&server, SpeechService::new(None)).await;

    let mut request = story_request_body();
    request["title"] = serde_json::json!("Fog Patrol");

    let response = app.oneshot(post_story(&token, request)).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["title"], "Fog Patrol");
}

#[tokio::test]
async fn test_generate_story_upstream_error_embeds_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("model overloaded"))
        .mount(&server)
        .await;

    let (app, token) = app_with_story_server(&server, SpeechService::new(None)).await;

    let response = app
        .oneshot(post_story(&token, story_request_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_json(response).await;
    assert_eq!(body["error"], "story_error");
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("HTTP 500"), "details: {details}");
    assert!(details.contains("model overloaded"), "details: {details}");
}

#[tokio::test]
async fn test_generate_story_without_key_fails_closed() {
    // Default test app has no Gemini key configured
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(post_story(&token, story_request_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(response).await;
    assert_eq!(body["error"], "missing_api_key");
}

#[tokio::test]
async fn test_concurrent_generation_for_same_account_conflicts() {
    let server = MockServer::start().await;
    // Slow response holds the first request's generation slot long enough
    // for the second request to collide with it.
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_ok_body("slow story"))
                .set_delay(std::time::Duration::from_millis(400)),
        )
        .mount(&server)
        .await;

    let (app, token) = app_with_story_server(&server, SpeechService::new(None)).await;

    let first = {
        let app = app.clone();
        let token = token.clone();
        tokio::spawn(async move { app.oneshot(post_story(&token, story_request_body())).await })
    };
    // Give the first request a head start so it reliably holds the slot.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    let second = {
        let token = token.clone();
        tokio::spawn(async move { app.oneshot(post_story(&token, story_request_body())).await })
    };

    let mut statuses = vec![
        first.await.unwrap().unwrap().status(),
        second.await.unwrap().unwrap().status(),
    ];
    statuses.sort();

    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);
}

// ─── Narration ───────────────────────────────────────────────

#[tokio::test]
async fn test_generate_story_with_narration_returns_data_uri() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_ok_body("narrated story")))
        .mount(&server)
        .await;
    // Default ElevenLabs voice
    Mock::given(method("POST"))
        .and(path("/v1/text-to-speech/21m00Tcm4TlvDq8ikWAM"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3fake-mpeg-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let speech = SpeechService::with_base_url(Some("tts-key".to_string()), server.uri());
    let (app, token) = app_with_story_server(&server, speech).await;

    let mut request = story_request_body();
    request["narrate"] = serde_json::json!(true);

    let response = app.oneshot(post_story(&token, request)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let audio = body["audio"].as_str().unwrap();
    assert!(
        audio.starts_with("data:audio/mpeg;base64,"),
        "audio: {audio}"
    );
}

#[tokio::test]
async fn test_narration_rejected_key_maps_to_invalid_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_ok_body("story")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/text-to-speech/21m00Tcm4TlvDq8ikWAM"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let speech = SpeechService::with_base_url(Some("revoked-key".to_string()), server.uri());
    let (app, token) = app_with_story_server(&server, speech).await;

    let mut request = story_request_body();
    request["narrate"] = serde_json::json!(true);

    let response = app.oneshot(post_story(&token, request)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_api_key");
}

#[tokio::test]
async fn test_narration_without_speech_key_fails_closed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_ok_body("story")))
        .mount(&server)
        .await;

    let (app, token) = app_with_story_server(&server, SpeechService::new(None)).await;

    let mut request = story_request_body();
    request["narrate"] = serde_json::json!(true);

    let response = app.oneshot(post_story(&token, request)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
