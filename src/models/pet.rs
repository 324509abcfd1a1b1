// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Virtual pet catalog and per-user awards.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A pet definition from the static catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct Pet {
    pub id: String,
    pub name: String,
    pub species: String,
    /// One of "common", "rare", "legendary"
    pub rarity: String,
    #[serde(default)]
    pub description: String,
}

/// A pet awarded to a user for fully locking a challenge.
///
/// Stored at: `userPets/{uid}_{pet_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPet {
    pub uid: String,
    pub pet_id: String,
    /// Challenge whose completion granted the pet
    pub source_challenge: String,
    /// Award timestamp (ISO 8601)
    pub awarded_at: String,
}
