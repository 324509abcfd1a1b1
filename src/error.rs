// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Already in progress: {0}")]
    Conflict(String),

    #[error("Missing API key for {0}")]
    MissingApiKey(&'static str),

    #[error("Invalid API key for {0}")]
    InvalidApiKey(&'static str),

    #[error("Story provider error: {0}")]
    StoryApi(String),

    #[error("Speech provider error: {0}")]
    SpeechApi(String),

    #[error("Directions provider error: {0}")]
    DirectionsApi(String),

    #[error("Media provider error: {0}")]
    MediaApi(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::MissingApiKey(service) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "missing_api_key",
                Some(format!("{service} is not configured")),
            ),
            AppError::InvalidApiKey(service) => (
                StatusCode::BAD_GATEWAY,
                "invalid_api_key",
                Some(format!("{service} rejected the configured API key")),
            ),
            AppError::StoryApi(msg) => (StatusCode::BAD_GATEWAY, "story_error", Some(msg.clone())),
            AppError::SpeechApi(msg) => {
                (StatusCode::BAD_GATEWAY, "speech_error", Some(msg.clone()))
            }
            AppError::DirectionsApi(msg) => {
                (StatusCode::BAD_GATEWAY, "directions_error", Some(msg.clone()))
            }
            AppError::MediaApi(msg) => (StatusCode::BAD_GATEWAY, "media_error", Some(msg.clone())),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
