//! Application configuration loaded from environment variables.
//!
//! Upstream SaaS credentials are optional: endpoints that need one fail
//! with a descriptive error at call time instead of blocking startup.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// GCP project hosting Firestore, when not the Firebase project
    pub gcp_project_id: Option<String>,
    /// Firebase project ID (ID token issuer/audience)
    pub firebase_project_id: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Challenge catalog data file
    pub challenges_data_path: String,
    /// Pet catalog data file
    pub pets_data_path: String,

    // --- Upstream SaaS credentials (all optional) ---
    /// Gemini API key (story generation)
    pub gemini_api_key: Option<String>,
    /// ElevenLabs API key (narration audio)
    pub elevenlabs_api_key: Option<String>,
    /// OpenRouteService API key (walking directions)
    pub ors_api_key: Option<String>,
    /// Cloudinary cloud name (avatar uploads)
    pub cloudinary_cloud_name: Option<String>,
    /// Cloudinary API key
    pub cloudinary_api_key: Option<String>,
    /// Cloudinary API secret (upload signatures)
    pub cloudinary_api_secret: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").ok(),
            firebase_project_id: env::var("FIREBASE_PROJECT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_PROJECT_ID"))?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            challenges_data_path: env::var("CHALLENGES_DATA_PATH")
                .unwrap_or_else(|_| "data/challenges.json".to_string()),
            pets_data_path: env::var("PETS_DATA_PATH")
                .unwrap_or_else(|_| "data/pets.json".to_string()),

            gemini_api_key: optional_secret("GEMINI_API_KEY"),
            elevenlabs_api_key: optional_secret("ELEVENLABS_API_KEY"),
            ors_api_key: optional_secret("ORS_API_KEY"),
            cloudinary_cloud_name: optional_secret("CLOUDINARY_CLOUD_NAME"),
            cloudinary_api_key: optional_secret("CLOUDINARY_API_KEY"),
            cloudinary_api_secret: optional_secret("CLOUDINARY_API_SECRET"),
        })
    }

    /// Project the Firestore client connects to.
    pub fn firestore_project_id(&self) -> &str {
        self.gcp_project_id
            .as_deref()
            .unwrap_or(&self.firebase_project_id)
    }

    /// Fixed configuration for tests; no env access.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:8081".to_string(),
            gcp_project_id: None,
            firebase_project_id: "pawquest-test".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            challenges_data_path: "data/challenges.json".to_string(),
            pets_data_path: "data/pets.json".to_string(),
            gemini_api_key: None,
            elevenlabs_api_key: None,
            ors_api_key: None,
            cloudinary_cloud_name: None,
            cloudinary_api_key: None,
            cloudinary_api_secret: None,
        }
    }
}

/// Read an optional credential, treating empty values as absent.
fn optional_secret(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
