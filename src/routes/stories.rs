// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Story generation and library routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{StoryChoices, StoryRecord};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/stories", post(generate_story).get(list_stories))
        .route("/api/stories/{id}", get(get_story).delete(delete_story))
}

#[derive(Deserialize)]
struct GenerateStoryRequest {
    choices: StoryChoices,
    /// Title override; derived from the choices when absent.
    title: Option<String>,
    /// Synthesize narration audio for the story.
    #[serde(default)]
    narrate: bool,
    /// Narration voice; the provider default when absent.
    voice_id: Option<String>,
    /// Persist the story to the user's library.
    #[serde(default)]
    save: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct StoryResponse {
    /// Set when the story was saved to the library.
    pub id: Option<String>,
    pub title: String,
    pub text: String,
    /// Narration audio as a `data:audio/mpeg;base64,...` URI.
    pub audio: Option<String>,
    pub created_at: String,
}

/// Generate a story, optionally narrating and saving it.
///
/// One generation per account runs at a time; a second request while one
/// is in flight gets a 409.
async fn generate_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<GenerateStoryRequest>,
) -> Result<Json<StoryResponse>> {
    body.choices
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    // Held until the full generate/narrate/save pipeline finishes.
    let _guard = state.story.begin_generation(&user.uid)?;

    let generated = state
        .story
        .generate(&body.choices, body.title.as_deref())
        .await?;

    let audio = if body.narrate {
        Some(
            state
                .speech
                .synthesize(&generated.text, body.voice_id.as_deref())
                .await?,
        )
    } else {
        None
    };

    let now = chrono::Utc::now();
    let created_at = format_utc_rfc3339(now);

    let id = if body.save {
        let record = StoryRecord {
            id: format!("{}_{}", user.uid, now.timestamp_millis()),
            uid: user.uid.clone(),
            title: generated.title.clone(),
            text: generated.text.clone(),
            choices: body.choices,
            voice_id: body.narrate.then_some(body.voice_id).flatten(),
            created_at: created_at.clone(),
        };
        state.db.insert_story(&record).await?;
        Some(record.id)
    } else {
        None
    };

    Ok(Json(StoryResponse {
        id,
        title: generated.title,
        text: generated.text,
        audio,
        created_at,
    }))
}

/// List the user's saved stories, newest first.
async fn list_stories(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<StoryRecord>>> {
    Ok(Json(state.db.get_stories_for_user(&user.uid).await?))
}

/// Get one saved story.
async fn get_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<StoryRecord>> {
    let story = state
        .db
        .get_story(&user.uid, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Story {id}")))?;

    Ok(Json(story))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct DeleteStoryResponse {
    pub success: bool,
}

/// Delete one saved story.
async fn delete_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteStoryResponse>> {
    if !state.db.delete_story(&user.uid, &id).await? {
        return Err(AppError::NotFound(format!("Story {id}")));
    }

    Ok(Json(DeleteStoryResponse { success: true }))
}
