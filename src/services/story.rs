// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Story generation via the Gemini text API.
//!
//! Turns a set of structured story choices into a short narrated-walk
//! story. Generation is expensive and user-triggered, so at most one
//! generation per account runs at a time.

use crate::error::AppError;
use crate::models::StoryChoices;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const GEMINI_MODEL: &str = "gemini-2.0-flash";
const MAX_OUTPUT_TOKENS: u32 = 2048;
const TEMPERATURE: f32 = 0.9;

/// A generated story, before optional narration and persistence.
#[derive(Debug, Clone)]
pub struct GeneratedStory {
    pub title: String,
    pub text: String,
}

/// Gemini-backed story generator.
#[derive(Clone)]
pub struct StoryService {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    /// Accounts with a generation currently in flight.
    in_flight: Arc<DashMap<String, ()>>,
}

/// Marks a story generation as in flight for one account.
///
/// Dropping the guard releases the slot, including on error paths.
pub struct GenerationGuard {
    in_flight: Arc<DashMap<String, ()>>,
    uid: String,
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        self.in_flight.remove(&self.uid);
    }
}

impl StoryService {
    /// Create a generator against the production Gemini endpoint.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a generator against a specific endpoint (used in tests).
    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Reserve the generation slot for an account.
    ///
    /// Returns `Conflict` if a generation is already running for `uid`.
    pub fn begin_generation(&self, uid: &str) -> Result<GenerationGuard, AppError> {
        match self.in_flight.entry(uid.to_string()) {
            Entry::Occupied(_) => Err(AppError::Conflict(
                "A story is already being generated for this account".to_string(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(GenerationGuard {
                    in_flight: self.in_flight.clone(),
                    uid: uid.to_string(),
                })
            }
        }
    }

    /// Generate story text from the user's choices.
    ///
    /// Fails before any network call if no API key is configured.
    pub async fn generate(
        &self,
        choices: &StoryChoices,
        title: Option<&str>,
    ) -> Result<GeneratedStory, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AppError::MissingApiKey("gemini"))?;

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: build_prompt(choices),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, GEMINI_MODEL
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::StoryApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::StoryApi(format!("HTTP {}: {}", status, body)));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::StoryApi(format!("JSON parse error: {}", e)))?;

        let text = story_text(&gemini_response)
            .ok_or_else(|| AppError::StoryApi("No text in response".to_string()))?;

        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| default_title(choices));

        tracing::info!(chars = text.len(), "Story generated");

        Ok(GeneratedStory { title, text })
    }
}

/// Build the generation prompt from the structured choices.
fn build_prompt(choices: &StoryChoices) -> String {
    format!(
        "Write an adventure story for a child to listen to during a walk.\n\
         \n\
         Hero: {hero}\n\
         Companion: {companion}\n\
         Setting: {setting}\n\
         Goal: {goal}\n\
         Tone: {tone}\n\
         \n\
         The story should take about {minutes} minutes to read aloud \
         (roughly {words} words). Use short paragraphs and simple language. \
         End on a happy note that encourages the listener to keep walking. \
         Respond with the story text only, no headings or markdown.",
        hero = choices.hero,
        companion = choices.companion,
        setting = choices.setting,
        goal = choices.goal,
        tone = choices.tone,
        minutes = choices.duration_minutes,
        words = choices.duration_minutes * 150,
    )
}

fn default_title(choices: &StoryChoices) -> String {
    format!("{} and the {}", choices.hero, choices.goal)
}

/// Extract the generated text from the first candidate's parts.
fn story_text(response: &GeminiResponse) -> Option<String> {
    let candidate = response.candidates.first()?;
    let parts = &candidate.content.as_ref()?.parts;

    let text: String = parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.trim().is_empty() {
        return None;
    }

    Some(text)
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}
