// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Walking directions via the OpenRouteService API.
//!
//! The primary request is a GET negotiating a GeoJSON response. Some
//! deployments reject that negotiation (406/415, or 400 from older
//! gateways), in which case the route is requested once more as a POST
//! against the explicit `/geojson` endpoint. Any other failure is not
//! retried.

use crate::error::AppError;
use geojson::GeoJson;
use serde::Serialize;

const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";
const WALKING_PROFILE: &str = "foot-walking";
const GEOJSON_ACCEPT: &str = "application/geo+json, application/json";

/// A walking route between two points.
#[derive(Debug, Serialize)]
pub struct WalkingRoute {
    /// GeoJSON feature holding the route geometry and segment details.
    pub route: geojson::Feature,
    pub distance_meters: f64,
    pub duration_secs: f64,
}

/// OpenRouteService directions client.
#[derive(Clone)]
pub struct DirectionsService {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl DirectionsService {
    /// Create a client against the production OpenRouteService endpoint.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a specific endpoint (used in tests).
    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Fetch a walking route between two `[lon, lat]` coordinates.
    pub async fn walking_route(
        &self,
        start: [f64; 2],
        end: [f64; 2],
    ) -> Result<WalkingRoute, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AppError::MissingApiKey("openrouteservice"))?;

        validate_coordinate(start)?;
        validate_coordinate(end)?;

        let url = format!("{}/v2/directions/{}", self.base_url, WALKING_PROFILE);

        let response = self
            .http
            .get(&url)
            .header("accept", GEOJSON_ACCEPT)
            .query(&[
                ("api_key", api_key.to_string()),
                ("start", format!("{},{}", start[0], start[1])),
                ("end", format!("{},{}", end[0], end[1])),
            ])
            .send()
            .await
            .map_err(|e| AppError::DirectionsApi(e.to_string()))?;

        let status = response.status();

        if status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| AppError::DirectionsApi(e.to_string()))?;
            return parse_route(&body);
        }

        // Content negotiation rejected; retry once as an explicit
        // GeoJSON POST. Anything else fails without a retry.
        if matches!(status.as_u16(), 400 | 406 | 415) {
            tracing::debug!(status = %status, "Directions GET rejected, retrying as POST");
            return self.walking_route_post(api_key, start, end).await;
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::DirectionsApi(format!("HTTP {}: {}", status, body)))
    }

    async fn walking_route_post(
        &self,
        api_key: &str,
        start: [f64; 2],
        end: [f64; 2],
    ) -> Result<WalkingRoute, AppError> {
        let url = format!(
            "{}/v2/directions/{}/geojson",
            self.base_url, WALKING_PROFILE
        );

        let body = serde_json::json!({
            "coordinates": [[start[0], start[1]], [end[0], end[1]]]
        });

        let response = self
            .http
            .post(&url)
            .header("authorization", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::DirectionsApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::DirectionsApi(format!("HTTP {}: {}", status, body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::DirectionsApi(e.to_string()))?;
        parse_route(&body)
    }
}

/// Reject coordinates outside WGS84 bounds.
pub fn validate_coordinate(coordinate: [f64; 2]) -> Result<(), AppError> {
    let [lon, lat] = coordinate;

    if !lon.is_finite() || !lat.is_finite() || !(-180.0..=180.0).contains(&lon)
        || !(-90.0..=90.0).contains(&lat)
    {
        return Err(AppError::BadRequest(format!(
            "Invalid coordinate: {lon},{lat}"
        )));
    }

    Ok(())
}

/// Parse a GeoJSON directions response into a route.
fn parse_route(body: &str) -> Result<WalkingRoute, AppError> {
    let geojson: GeoJson = body
        .parse()
        .map_err(|e: geojson::Error| AppError::DirectionsApi(format!("GeoJSON parse error: {e}")))?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(AppError::DirectionsApi(
            "Route response is not a FeatureCollection".to_string(),
        ));
    };

    let feature = collection
        .features
        .into_iter()
        .next()
        .ok_or_else(|| AppError::DirectionsApi("Route response has no features".to_string()))?;

    let summary = feature
        .property("summary")
        .and_then(|v| v.as_object())
        .ok_or_else(|| AppError::DirectionsApi("Route response missing summary".to_string()))?;

    let distance_meters = summary.get("distance").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let duration_secs = summary.get("duration").and_then(|v| v.as_f64()).unwrap_or(0.0);

    Ok(WalkingRoute {
        route: feature,
        distance_meters,
        duration_secs,
    })
}
