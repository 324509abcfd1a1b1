// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use pawquest_api::config::Config;
use pawquest_api::db::FirestoreDb;
use pawquest_api::routes::create_router;
use pawquest_api::services::{
    ChallengeCatalog, DirectionsService, FirebaseAuthVerifier, MediaService, SpeechService,
    StoryService,
};
use pawquest_api::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Fixed catalog for tests: one challenge with a reward pet, one without.
#[allow(dead_code)]
pub fn test_catalog() -> ChallengeCatalog {
    let challenges = r#"[
        {
            "id": "riverside-loop",
            "title": "Riverside Loop",
            "description": "Follow the creek path past the old footbridge.",
            "area": "Riverside Park",
            "start": [-122.0574, 37.3894],
            "variants": {
                "easy": { "distance_meters": 1200, "reward_xp": 50 },
                "hard": { "distance_meters": 3200, "reward_xp": 140 }
            },
            "reward_pet": "luna-husky"
        },
        {
            "id": "meadow-sprint",
            "title": "Meadow Sprint",
            "description": "A short dash across the open meadow.",
            "area": "East Meadow",
            "start": [-122.0612, 37.3901],
            "variants": {
                "easy": { "distance_meters": 800, "reward_xp": 40 },
                "hard": { "distance_meters": 2000, "reward_xp": 100 }
            }
        }
    ]"#;
    let pets = r#"[
        {
            "id": "luna-husky",
            "name": "Luna",
            "species": "Husky",
            "rarity": "rare",
            "description": "Howls at the riverside moon."
        },
        {
            "id": "scout-beagle",
            "name": "Scout",
            "species": "Beagle",
            "rarity": "common",
            "description": "Nose to the ground, always on a trail."
        }
    ]"#;
    ChallengeCatalog::load_from_json(challenges, pets).expect("test catalog must load")
}

/// Create a session JWT the auth middleware accepts.
#[allow(dead_code)]
pub fn create_test_jwt(uid: &str, signing_key: &[u8]) -> String {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde::Serialize;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: usize,
        iat: usize,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        sub: uid.to_string(),
        exp: now + 86400,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

/// Create a test app with specific upstream service clients, so tests can
/// point them at a wiremock server.
#[allow(dead_code)]
pub fn create_test_app_with_services(
    db: FirestoreDb,
    story: StoryService,
    speech: SpeechService,
    directions: DirectionsService,
    media: MediaService,
) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let identity =
        Arc::new(FirebaseAuthVerifier::new(&config).expect("test verifier must build"));

    let state = Arc::new(AppState {
        config,
        db,
        catalog: test_catalog(),
        identity,
        story,
        speech,
        directions,
        media,
    });

    (create_router(state.clone()), state)
}

/// Create a test app with offline mock dependencies and no upstream keys.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_services(
        test_db_offline(),
        StoryService::new(None),
        SpeechService::new(None),
        DirectionsService::new(None),
        MediaService::new(None, None, None),
    )
}
