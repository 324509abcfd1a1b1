// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge and pet catalog loading.
//!
//! The catalog is static content shipped with the service as JSON data
//! files. It is loaded once at startup and shared read-only from then on.

use crate::models::{Challenge, Pet};
use std::fs;
use std::path::Path;

/// In-memory catalog of walking challenges and collectible pets.
#[derive(Default, Clone)]
pub struct ChallengeCatalog {
    challenges: Vec<Challenge>,
    pets: Vec<Pet>,
}

impl ChallengeCatalog {
    /// Load the catalog from JSON data files.
    pub fn load_from_files<P: AsRef<Path>>(
        challenges_path: P,
        pets_path: P,
    ) -> Result<Self, CatalogError> {
        let challenges_json = fs::read_to_string(challenges_path.as_ref())
            .map_err(|e| CatalogError::IoError(e.to_string()))?;
        let pets_json = fs::read_to_string(pets_path.as_ref())
            .map_err(|e| CatalogError::IoError(e.to_string()))?;
        Self::load_from_json(&challenges_json, &pets_json)
    }

    /// Load the catalog from JSON strings.
    pub fn load_from_json(challenges_json: &str, pets_json: &str) -> Result<Self, CatalogError> {
        let challenges: Vec<Challenge> = serde_json::from_str(challenges_json)
            .map_err(|e| CatalogError::ParseError(format!("challenges: {e}")))?;
        let pets: Vec<Pet> = serde_json::from_str(pets_json)
            .map_err(|e| CatalogError::ParseError(format!("pets: {e}")))?;

        for (i, pet) in pets.iter().enumerate() {
            if pet.id.trim().is_empty() {
                return Err(CatalogError::InvalidEntry(format!("pet #{i} has no id")));
            }
            if pets[..i].iter().any(|p| p.id == pet.id) {
                return Err(CatalogError::DuplicateId(pet.id.clone()));
            }
        }

        for (i, challenge) in challenges.iter().enumerate() {
            if challenge.id.trim().is_empty() {
                return Err(CatalogError::InvalidEntry(format!(
                    "challenge #{i} has no id"
                )));
            }
            if challenges[..i].iter().any(|c| c.id == challenge.id) {
                return Err(CatalogError::DuplicateId(challenge.id.clone()));
            }
            if let Some(pet_id) = &challenge.reward_pet {
                if !pets.iter().any(|p| &p.id == pet_id) {
                    return Err(CatalogError::UnknownRewardPet {
                        challenge: challenge.id.clone(),
                        pet: pet_id.clone(),
                    });
                }
            }
        }

        tracing::info!(
            challenges = challenges.len(),
            pets = pets.len(),
            "Loaded challenge catalog"
        );
        Ok(Self { challenges, pets })
    }

    /// Get all challenges in catalog order.
    pub fn challenges(&self) -> &[Challenge] {
        &self.challenges
    }

    /// Look up a challenge by id.
    pub fn challenge(&self, id: &str) -> Option<&Challenge> {
        self.challenges.iter().find(|c| c.id == id)
    }

    /// Get all pets in catalog order.
    pub fn pets(&self) -> &[Pet] {
        &self.pets
    }

    /// Look up a pet by id.
    pub fn pet(&self, id: &str) -> Option<&Pet> {
        self.pets.iter().find(|p| p.id == id)
    }
}

/// Errors from catalog loading.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse catalog JSON: {0}")]
    ParseError(String),

    #[error("Invalid catalog entry: {0}")]
    InvalidEntry(String),

    #[error("Duplicate catalog id: {0}")]
    DuplicateId(String),

    #[error("Challenge {challenge} rewards unknown pet {pet}")]
    UnknownRewardPet { challenge: String, pet: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHALLENGES: &str = r#"[
        {
            "id": "creek-loop",
            "title": "Creek Loop",
            "description": "An easy walk along the creek.",
            "area": "Riverside Park",
            "start": [-122.0819, 37.3897],
            "variants": {
                "easy": { "distance_meters": 1200, "reward_xp": 50 },
                "hard": { "distance_meters": 32e3, "reward_xp": 140 }
            },
            "reward_pet": "otter-ollie"
        }
    ]"#;

    const PETS: &str = r#"[
        {
            "id": "otter-ollie",
            "name": "Ollie",
            "species": "otter",
            "rarity": "rare",
            "description": "Loves creek loops."
        }
    ]"#;

    #[test]
    fn loads_catalog_and_looks_up_entries() {
        let catalog = ChallengeCatalog::load_from_json(CHALLENGES, PETS).unwrap();

        assert_eq!(catalog.challenges().len(), 1);
        assert_eq!(catalog.pets().len(), 1);

        let challenge = catalog.challenge("creek-loop").unwrap();
        assert_eq!(challenge.variants.easy.distance_meters, 1200.0);
        assert_eq!(challenge.reward_pet.as_deref(), Some("otter-ollie"));
        assert_eq!(catalog.pet("otter-ollie").unwrap().name, "Ollie");

        assert!(catalog.challenge("nope").is_none());
        assert!(catalog.pet("nope").is_none());
    }

    #[test]
    fn rejects_duplicate_challenge_ids() {
        let doubled = format!(
            "[{},{}]",
            CHALLENGES.trim().trim_start_matches('[').trim_end_matches(']'),
            CHALLENGES.trim().trim_start_matches('[').trim_end_matches(']')
        );

        let result = ChallengeCatalog::load_from_json(&doubled, PETS);
        assert!(matches!(result, Err(CatalogError::DuplicateId(id)) if id == "creek-loop"));
    }

    #[test]
    fn rejects_unknown_reward_pet() {
        let result = ChallengeCatalog::load_from_json(CHALLENGES, "[]");
        assert!(matches!(
            result,
            Err(CatalogError::UnknownRewardPet { .. })
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        let result = ChallengeCatalog::load_from_json("not json", PETS);
        assert!(matches!(result, Err(CatalogError::ParseError(_))));
    }
}
