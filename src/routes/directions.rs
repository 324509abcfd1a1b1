// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Walking directions route.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::services::WalkingRoute;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/directions/walking", get(walking_directions))
}

#[derive(Deserialize)]
struct DirectionsQuery {
    /// Start coordinate as "lon,lat"
    start: String,
    /// End coordinate as "lon,lat"
    end: String,
}

fn parse_lon_lat(raw: &str) -> Result<[f64; 2]> {
    let invalid =
        || AppError::BadRequest(format!("Invalid coordinate: {raw} (want \"lon,lat\")"));

    let (lon, lat) = raw.split_once(',').ok_or_else(invalid)?;
    let lon = lon.trim().parse::<f64>().map_err(|_| invalid())?;
    let lat = lat.trim().parse::<f64>().map_err(|_| invalid())?;

    Ok([lon, lat])
}

/// Get a walking route between two coordinates.
async fn walking_directions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<DirectionsQuery>,
) -> Result<Json<WalkingRoute>> {
    let start = parse_lon_lat(&params.start)?;
    let end = parse_lon_lat(&params.end)?;

    tracing::debug!(
        uid = %user.uid,
        start = %params.start,
        end = %params.end,
        "Fetching walking route"
    );

    let route = state.directions.walking_route(start, end).await?;

    Ok(Json(route))
}
