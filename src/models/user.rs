//! User profile model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// User profile stored in Firestore, keyed by the identity provider uid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct UserProfile {
    pub uid: String,
    /// Email address (may be None if the provider did not share one)
    pub email: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    /// Age in years, self-reported
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    /// One of "sedentary", "moderate", "active"
    #[serde(default)]
    pub activity_level: Option<String>,
    /// First sign-in (ISO 8601); preserved across profile edits
    pub created_at: String,
    pub updated_at: String,
}

fn default_role() -> String {
    "user".to_string()
}

pub const ACTIVITY_LEVELS: [&str; 3] = ["sedentary", "moderate", "active"];

/// Partial profile update from the settings screen.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 60))]
    pub display_name: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
    #[validate(range(min = 5, max = 120))]
    pub age: Option<u32>,
    #[validate(range(min = 20.0, max = 300.0))]
    pub weight_kg: Option<f64>,
    #[validate(custom(function = "validate_activity_level"))]
    pub activity_level: Option<String>,
}

fn validate_activity_level(level: &str) -> Result<(), validator::ValidationError> {
    if ACTIVITY_LEVELS.contains(&level) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("activity_level"))
    }
}

impl UserProfile {
    /// Create the profile written on first sign-in.
    pub fn new_from_login(
        uid: &str,
        email: Option<String>,
        display_name: Option<String>,
        avatar_url: Option<String>,
        now: &str,
    ) -> Self {
        Self {
            uid: uid.to_string(),
            display_name: display_name.unwrap_or_else(|| "Explorer".to_string()),
            email,
            avatar_url,
            role: default_role(),
            age: None,
            weight_kg: None,
            activity_level: None,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    /// Apply a partial update. `created_at` is never touched.
    pub fn apply_update(&mut self, update: &UpdateProfileRequest, now: &str) {
        if let Some(name) = &update.display_name {
            self.display_name = name.clone();
        }
        if let Some(url) = &update.avatar_url {
            self.avatar_url = Some(url.clone());
        }
        if let Some(age) = update.age {
            self.age = Some(age);
        }
        if let Some(weight) = update.weight_kg {
            self.weight_kg = Some(weight);
        }
        if let Some(level) = &update.activity_level {
            self.activity_level = Some(level.clone());
        }
        self.updated_at = now.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_update_preserves_created_at() {
        let mut profile = UserProfile::new_from_login(
            "uid1",
            Some("a@example.com".to_string()),
            Some("Ada".to_string()),
            None,
            "2026-01-01T00:00:00Z",
        );
        let update = UpdateProfileRequest {
            display_name: Some("Ada L.".to_string()),
            age: Some(31),
            ..Default::default()
        };

        profile.apply_update(&update, "2026-03-09T00:00:00Z");

        assert_eq!(profile.display_name, "Ada L.");
        assert_eq!(profile.age, Some(31));
        assert_eq!(profile.created_at, "2026-01-01T00:00:00Z");
        assert_eq!(profile.updated_at, "2026-03-09T00:00:00Z");
    }

    #[test]
    fn test_update_validation() {
        let valid = UpdateProfileRequest {
            activity_level: Some("moderate".to_string()),
            ..Default::default()
        };
        assert!(valid.validate().is_ok());

        let bad_level = UpdateProfileRequest {
            activity_level: Some("extreme".to_string()),
            ..Default::default()
        };
        assert!(bad_level.validate().is_err());

        let bad_age = UpdateProfileRequest {
            age: Some(150),
            ..Default::default()
        };
        assert!(bad_age.validate().is_err());
    }
}
