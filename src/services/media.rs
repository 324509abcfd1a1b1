// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Avatar uploads via the Cloudinary signed upload API.

use crate::error::AppError;
use serde::Deserialize;
use sha2::{Digest, Sha256};

const DEFAULT_BASE_URL: &str = "https://api.cloudinary.com";
const AVATAR_FOLDER: &str = "pawquest/avatars";

/// Uploaded images are sent as base64 data URIs; cap the payload well
/// below Cloudinary's own limit so oversize uploads fail locally.
const MAX_DATA_URI_BYTES: usize = 7 * 1024 * 1024;

#[derive(Clone)]
struct CloudinaryCredentials {
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

/// Cloudinary image upload client.
#[derive(Clone)]
pub struct MediaService {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<CloudinaryCredentials>,
}

impl MediaService {
    /// Create a client against the production Cloudinary endpoint.
    ///
    /// Uploads stay disabled unless all three credentials are present.
    pub fn new(
        cloud_name: Option<String>,
        api_key: Option<String>,
        api_secret: Option<String>,
    ) -> Self {
        Self::with_base_url(cloud_name, api_key, api_secret, DEFAULT_BASE_URL)
    }

    /// Create a client against a specific endpoint (used in tests).
    pub fn with_base_url(
        cloud_name: Option<String>,
        api_key: Option<String>,
        api_secret: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let provided = [&cloud_name, &api_key, &api_secret]
            .iter()
            .filter(|v| v.is_some())
            .count();

        let credentials = match (cloud_name, api_key, api_secret) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryCredentials {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => {
                if provided > 0 {
                    tracing::warn!(
                        "Cloudinary is only partially configured; avatar uploads disabled"
                    );
                }
                None
            }
        };

        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            credentials,
        }
    }

    /// Upload a user's avatar image and return its hosted URL.
    ///
    /// `image` must be a base64 `data:image/...` URI. Re-uploading for the
    /// same user replaces the previous avatar (deterministic public id).
    pub async fn upload_avatar(&self, uid: &str, image: &str) -> Result<String, AppError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(AppError::MissingApiKey("cloudinary"))?;

        if !image.starts_with("data:image/") || !image.contains(";base64,") {
            return Err(AppError::BadRequest(
                "Image must be a base64 data URI".to_string(),
            ));
        }

        if image.len() > MAX_DATA_URI_BYTES {
            return Err(AppError::BadRequest("Image is too large".to_string()));
        }

        let timestamp = chrono::Utc::now().timestamp();
        let public_id = urlencoding::encode(uid).into_owned();

        let signature = sign_params(
            &[
                ("folder", AVATAR_FOLDER),
                ("public_id", &public_id),
                ("timestamp", &timestamp.to_string()),
            ],
            &credentials.api_secret,
        );

        let form = reqwest::multipart::Form::new()
            .text("file", image.to_string())
            .text("api_key", credentials.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
            .text("folder", AVATAR_FOLDER)
            .text("public_id", public_id);

        let url = format!(
            "{}/v1_1/{}/image/upload",
            self.base_url, credentials.cloud_name
        );

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::MediaApi(e.to_string()))?;

        if response.status().as_u16() == 401 {
            return Err(AppError::InvalidApiKey("cloudinary"));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::MediaApi(format!("HTTP {}: {}", status, body)));
        }

        let upload: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::MediaApi(format!("JSON parse error: {}", e)))?;

        tracing::info!(uid, "Avatar uploaded");

        Ok(upload.secure_url)
    }
}

/// Compute a Cloudinary request signature.
///
/// Parameters are signed as `key=value` pairs sorted by key, joined with
/// `&`, with the API secret appended, hashed with SHA-256, hex-encoded.
fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(string_to_sign(params).as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn string_to_sign(params: &[(&str, &str)]) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
    sorted.sort_by_key(|(key, _)| *key);

    sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}
