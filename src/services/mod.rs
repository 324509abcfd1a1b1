// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod catalog;
pub mod directions;
pub mod identity;
pub mod media;
pub mod speech;
pub mod story;

pub use catalog::ChallengeCatalog;
pub use directions::{DirectionsService, WalkingRoute};
pub use identity::{FirebaseAuthVerifier, IdentityError, VerifiedIdentity};
pub use media::MediaService;
pub use speech::SpeechService;
pub use story::{GeneratedStory, StoryService};
