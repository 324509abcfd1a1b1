// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Saved story documents for the "My Stories" screen.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Structured choices the user picks before generation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct StoryChoices {
    /// Protagonist, e.g. "a shy fox"
    #[validate(length(min = 1, max = 80))]
    pub hero: String,
    #[validate(length(min = 1, max = 80))]
    pub companion: String,
    #[validate(length(min = 1, max = 80))]
    pub setting: String,
    /// What the walk is for, e.g. "finding the lost lantern"
    #[validate(length(min = 1, max = 120))]
    pub goal: String,
    /// Narration tone, e.g. "calm", "adventurous"
    #[validate(length(min = 1, max = 40))]
    pub tone: String,
    /// Target listening length, matched to the planned walk
    #[validate(range(min = 1, max = 60))]
    pub duration_minutes: u32,
}

/// A persisted story.
///
/// Stored at: `stories/{uid}_{millis}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct StoryRecord {
    pub id: String,
    pub uid: String,
    pub title: String,
    /// Generated narrative text
    pub text: String,
    pub choices: StoryChoices,
    /// Voice used for narration, when audio was synthesized
    #[serde(default)]
    pub voice_id: Option<String>,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
}
