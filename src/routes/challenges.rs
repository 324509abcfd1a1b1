// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge catalog, completion, and pet collection routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    extract_variant_completion, is_challenge_fully_locked, Challenge, Pet, VariantCompletion,
    VariantName,
};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/challenges", get(list_challenges))
        .route("/api/challenges/{id}", get(get_challenge))
        .route("/api/challenges/{id}/complete", post(complete_challenge))
        .route("/api/pets", get(list_pets))
}

// ─── Challenges ──────────────────────────────────────────────

/// A catalog challenge with the caller's progress.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct ChallengeStateResponse {
    pub challenge: Challenge,
    pub completion: VariantCompletion,
    pub fully_locked: bool,
}

/// List all challenges with the caller's completion state.
async fn list_challenges(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ChallengeStateResponse>>> {
    let runs = state.db.get_run_records_for_user(&user.uid).await?;

    // Completion flags by challenge id, derived from the composite doc ids.
    let completion_by_id: HashMap<&str, VariantCompletion> = runs
        .iter()
        .filter_map(|run| {
            let challenge_id = run.challenge_id(&user.uid)?;
            Some((challenge_id, extract_variant_completion(&run.record)))
        })
        .collect();

    let challenges = state
        .catalog
        .challenges()
        .iter()
        .map(|challenge| {
            let completion = completion_by_id
                .get(challenge.id.as_str())
                .copied()
                .unwrap_or_default();

            ChallengeStateResponse {
                challenge: challenge.clone(),
                completion,
                fully_locked: is_challenge_fully_locked(completion),
            }
        })
        .collect();

    Ok(Json(challenges))
}

/// Get one challenge with the caller's completion state.
async fn get_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ChallengeStateResponse>> {
    let challenge = state
        .catalog
        .challenge(&id)
        .ok_or_else(|| AppError::NotFound(format!("Challenge {id}")))?;

    let completion = state
        .db
        .get_run_record(&user.uid, &id)
        .await?
        .map(|record| extract_variant_completion(&record))
        .unwrap_or_default();

    Ok(Json(ChallengeStateResponse {
        challenge: challenge.clone(),
        completion,
        fully_locked: is_challenge_fully_locked(completion),
    }))
}

// ─── Completion ──────────────────────────────────────────────

#[derive(Deserialize)]
struct CompleteChallengeRequest {
    /// "easy" or "hard" (case-insensitive, matching older clients)
    variant: String,
    duration_secs: Option<f64>,
    distance_meters: Option<f64>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct CompleteChallengeResponse {
    pub completion: VariantCompletion,
    pub fully_locked: bool,
    /// False when this variant was already complete.
    pub newly_completed: bool,
    /// The reward pet, when this call locked the challenge.
    pub awarded_pet: Option<Pet>,
    pub reward_xp: u32,
}

/// Record a variant completion for a challenge.
async fn complete_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<CompleteChallengeRequest>,
) -> Result<Json<CompleteChallengeResponse>> {
    let challenge = state
        .catalog
        .challenge(&id)
        .ok_or_else(|| AppError::NotFound(format!("Challenge {id}")))?;

    let variant = VariantName::parse(&body.variant)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown variant: {}", body.variant)))?;

    for value in [body.duration_secs, body.distance_meters].into_iter().flatten() {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::BadRequest(
                "duration_secs and distance_meters must be non-negative".to_string(),
            ));
        }
    }

    let outcome = state
        .db
        .complete_challenge_variant(
            &user.uid,
            challenge,
            variant,
            body.duration_secs,
            body.distance_meters,
        )
        .await?;

    let awarded_pet = outcome.awarded_pet.as_ref().and_then(|award| {
        let pet = state.catalog.pet(&award.pet_id);
        if pet.is_none() {
            tracing::warn!(pet_id = %award.pet_id, "Awarded pet missing from catalog");
        }
        pet.cloned()
    });

    let reward_xp = if outcome.newly_completed {
        match variant {
            VariantName::Easy => challenge.variants.easy.reward_xp,
            VariantName::Hard => challenge.variants.hard.reward_xp,
        }
    } else {
        0
    };

    Ok(Json(CompleteChallengeResponse {
        completion: outcome.completion,
        fully_locked: is_challenge_fully_locked(outcome.completion),
        newly_completed: outcome.newly_completed,
        awarded_pet,
        reward_xp,
    }))
}

// ─── Pets ────────────────────────────────────────────────────

/// A pet the user has collected.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct CollectedPetResponse {
    pub pet: Pet,
    pub source_challenge: String,
    pub awarded_at: String,
}

/// List the user's collected pets, newest first.
async fn list_pets(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<CollectedPetResponse>>> {
    let awards = state.db.get_user_pets(&user.uid).await?;

    let pets = awards
        .into_iter()
        .filter_map(|award| {
            let Some(pet) = state.catalog.pet(&award.pet_id) else {
                // Catalog entries can be retired; old awards then have no
                // definition to show.
                tracing::warn!(pet_id = %award.pet_id, "Collected pet missing from catalog");
                return None;
            };

            Some(CollectedPetResponse {
                pet: pet.clone(),
                source_challenge: award.source_challenge,
                awarded_at: award.awarded_at,
            })
        })
        .collect();

    Ok(Json(pets))
}
