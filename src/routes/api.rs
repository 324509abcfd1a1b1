// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users: profile, metrics, avatar.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{DailyEntry, MergeMode, MetricKind, UpdateProfileRequest, UserProfile};
use crate::time_utils::{format_day_key, format_utc_rfc3339, parse_day_key, utc_today};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).put(update_me))
        .route("/api/account", delete(delete_account))
        .route("/api/metrics/{metric}", get(get_metric).post(upsert_metric))
        .route("/api/media/avatar", post(upload_avatar))
}

// ─── User Profile ────────────────────────────────────────────

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let profile = state
        .db
        .get_user(&user.uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.uid)))?;

    Ok(Json(profile))
}

/// Apply a partial profile update.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>> {
    update
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut profile = state
        .db
        .get_user(&user.uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.uid)))?;

    profile.apply_update(&update, &format_utc_rfc3339(chrono::Utc::now()));
    state.db.upsert_user(&profile).await?;

    tracing::info!(uid = %user.uid, "Profile updated");

    Ok(Json(profile))
}

// ─── Account Deletion ────────────────────────────────────────

/// Response for account deletion.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub message: String,
}

/// Delete the user's account and all associated data (GDPR compliance).
///
/// Removes the profile plus every metric, run, pet, and story document
/// before responding.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DeleteAccountResponse>> {
    tracing::info!(uid = %user.uid, "User-initiated account deletion");

    let deleted = state.db.delete_user_data(&user.uid).await?;

    Ok(Json(DeleteAccountResponse {
        success: true,
        message: format!("Account deleted ({deleted} documents removed)"),
    }))
}

// ─── Daily Metrics ───────────────────────────────────────────

#[derive(Deserialize)]
struct MetricReadQuery {
    /// Day anchoring the 7-day window; defaults to the current UTC day.
    today: Option<String>,
}

/// One metric's rolling window.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct MetricWindowResponse {
    pub metric: String,
    /// Anchor day used for pruning (YYYY-MM-DD).
    pub today: String,
    pub entries: Vec<DailyEntry>,
}

#[derive(Deserialize)]
struct MetricUpsertRequest {
    date: String,
    value: f64,
    #[serde(default = "default_merge_mode")]
    mode: MergeMode,
}

fn default_merge_mode() -> MergeMode {
    MergeMode::Replace
}

fn parse_metric(metric: &str) -> Result<MetricKind> {
    MetricKind::parse(metric).ok_or_else(|| AppError::NotFound(format!("Metric {metric}")))
}

fn parse_anchor(today: Option<&str>) -> Result<chrono::NaiveDate> {
    match today {
        None => Ok(utc_today()),
        Some(raw) => parse_day_key(raw).ok_or_else(|| {
            AppError::BadRequest(format!("Invalid 'today' parameter: {raw} (want YYYY-MM-DD)"))
        }),
    }
}

/// Get the rolling window for one metric.
async fn get_metric(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(metric): Path<String>,
    Query(params): Query<MetricReadQuery>,
) -> Result<Json<MetricWindowResponse>> {
    let kind = parse_metric(&metric)?;
    let anchor = parse_anchor(params.today.as_deref())?;

    let entries = state.db.get_metric_window(&user.uid, kind, anchor).await?;

    Ok(Json(MetricWindowResponse {
        metric: kind.as_str().to_string(),
        today: format_day_key(anchor),
        entries,
    }))
}

/// Merge one day's value into a metric and return the new window.
async fn upsert_metric(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(metric): Path<String>,
    Json(body): Json<MetricUpsertRequest>,
) -> Result<Json<MetricWindowResponse>> {
    let kind = parse_metric(&metric)?;

    let day = parse_day_key(&body.date).ok_or_else(|| {
        AppError::BadRequest(format!("Invalid date: {} (want YYYY-MM-DD)", body.date))
    })?;

    if !body.value.is_finite() {
        return Err(AppError::BadRequest("Value must be finite".to_string()));
    }

    let entries = state
        .db
        .upsert_daily_metric(&user.uid, kind, day, body.value, body.mode)
        .await?;

    Ok(Json(MetricWindowResponse {
        metric: kind.as_str().to_string(),
        today: format_day_key(day),
        entries,
    }))
}

// ─── Avatar Upload ───────────────────────────────────────────

#[derive(Deserialize)]
struct AvatarUploadRequest {
    /// Base64 `data:image/...` URI.
    image: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct AvatarResponse {
    pub avatar_url: String,
}

/// Upload an avatar image and store its hosted URL on the profile.
async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<AvatarUploadRequest>,
) -> Result<Json<AvatarResponse>> {
    let mut profile = state
        .db
        .get_user(&user.uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.uid)))?;

    let avatar_url = state.media.upload_avatar(&user.uid, &body.image).await?;

    profile.avatar_url = Some(avatar_url.clone());
    profile.updated_at = format_utc_rfc3339(chrono::Utc::now());
    state.db.upsert_user(&profile).await?;

    Ok(Json(AvatarResponse { avatar_url }))
}
