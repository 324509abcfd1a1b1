// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Text-to-speech narration via the ElevenLabs API.

use crate::error::AppError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serialize;

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
const TTS_MODEL: &str = "eleven_multilingual_v2";

/// ElevenLabs text-to-speech client.
#[derive(Clone)]
pub struct SpeechService {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl SpeechService {
    /// Create a client against the production ElevenLabs endpoint.
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

    /// Synthesize narration audio for a story.
    ///
    /// Returns the audio as a `data:audio/mpeg;base64,...` URI so clients
    /// can play it without a follow-up fetch. Fails before any network
    /// call if no API key is configured.
    pub async fn synthesize(&self, text: &str, voice_id: Option<&str>) -> Result<String, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AppError::MissingApiKey("elevenlabs"))?;

        let voice_id = match voice_id {
            Some(id) => {
                // The voice id is interpolated into the request path.
                if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(AppError::BadRequest(format!("Invalid voice id: {id}")));
                }
                id
            }
            None => DEFAULT_VOICE_ID,
        };

        let request = TtsRequest {
            text,
            model_id: TTS_MODEL,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
            },
        };

        let url = format!("{}/v1/text-to-speech/{}", self.base_url, voice_id);

        let response = self
            .http
            .post(&url)
            .header("xi-api-key", api_key)
            .header("accept", "audio/mpeg")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::SpeechApi(e.to_string()))?;

        if response.status().as_u16() == 401 {
            return Err(AppError::InvalidApiKey("elevenlabs"));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::SpeechApi(format!("HTTP {}: {}", status, body)));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| AppError::SpeechApi(e.to_string()))?;

        if audio.is_empty() {
            return Err(AppError::SpeechApi("Empty audio response".to_string()));
        }

        tracing::info!(bytes = audio.len(), voice_id, "Narration synthesized");

        Ok(format!("data:audio/mpeg;base64,{}", BASE64.encode(&audio)))
    }
}

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}
