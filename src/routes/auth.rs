// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in route: Firebase ID token in, session JWT out.

use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_session_jwt, SESSION_COOKIE};
use crate::models::UserProfile;
use crate::services::IdentityError;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/login", post(login))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    id_token: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Verify the Firebase ID token, upsert the profile, mint a session.
///
/// The session JWT is returned in the body (for the mobile client's
/// Authorization header) and set as a cookie (for web views).
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let identity = state
        .identity
        .verify_id_token(&body.id_token)
        .await
        .map_err(|e| match e {
            IdentityError::Forbidden(msg) => {
                tracing::warn!(error = %msg, "Login token rejected");
                AppError::InvalidToken
            }
            IdentityError::Transient(msg) => {
                AppError::Internal(anyhow::anyhow!("Identity verification failed: {msg}"))
            }
        })?;

    let now = format_utc_rfc3339(chrono::Utc::now());

    let profile = match state.db.get_user(&identity.uid).await? {
        Some(mut existing) => {
            // Refresh provider-sourced fields the user has not overridden.
            if existing.email.is_none() {
                existing.email = identity.email;
            }
            if existing.avatar_url.is_none() {
                existing.avatar_url = identity.avatar_url;
            }
            existing.updated_at = now;
            existing
        }
        None => {
            tracing::info!(uid = %identity.uid, "First sign-in, creating profile");
            UserProfile::new_from_login(
                &identity.uid,
                identity.email,
                identity.display_name,
                identity.avatar_url,
                &now,
            )
        }
    };

    state.db.upsert_user(&profile).await?;

    let token = create_session_jwt(&profile.uid, &state.config.jwt_signing_key)?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build();

    tracing::info!(uid = %profile.uid, "Login successful");

    Ok((jar.add(cookie), Json(LoginResponse { token, user: profile })))
}
