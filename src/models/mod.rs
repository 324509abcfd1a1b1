// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod challenge;
pub mod metrics;
pub mod pet;
pub mod story;
pub mod user;

pub use challenge::{
    apply_variant_completion, extract_variant_completion, is_challenge_fully_locked, Challenge,
    VariantCompletion, VariantName,
};
pub use metrics::{DailyEntry, MergeMode, MetricDocument, MetricKind};
pub use pet::{Pet, UserPet};
pub use story::{StoryChoices, StoryRecord};
pub use user::{UpdateProfileRequest, UserProfile};
