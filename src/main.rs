// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PawQuest API Server
//!
//! Serves the PawQuest mobile app: challenge catalog and completions,
//! rolling daily metrics, story generation with narration, walking
//! directions, and avatar uploads.

use pawquest_api::{
    config::Config,
    db::FirestoreDb,
    services::{
        ChallengeCatalog, DirectionsService, FirebaseAuthVerifier, MediaService, SpeechService,
        StoryService,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting PawQuest API");

    // Initialize Firestore database
    let db = FirestoreDb::new(config.firestore_project_id())
        .await
        .expect("Failed to connect to Firestore");

    // Load the challenge and pet catalog
    tracing::info!(
        challenges = %config.challenges_data_path,
        pets = %config.pets_data_path,
        "Loading challenge catalog"
    );
    let catalog =
        ChallengeCatalog::load_from_files(&config.challenges_data_path, &config.pets_data_path)
            .expect("Failed to load challenge catalog");

    // Initialize the Firebase ID token verifier
    let identity =
        Arc::new(FirebaseAuthVerifier::new(&config).expect("Failed to initialize token verifier"));

    // Upstream SaaS clients; each fails closed at call time when its
    // credential is absent.
    let story = StoryService::new(config.gemini_api_key.clone());
    let speech = SpeechService::new(config.elevenlabs_api_key.clone());
    let directions = DirectionsService::new(config.ors_api_key.clone());
    let media = MediaService::new(
        config.cloudinary_cloud_name.clone(),
        config.cloudinary_api_key.clone(),
        config.cloudinary_api_secret.clone(),
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        catalog,
        identity,
        story,
        speech,
        directions,
        media,
    });

    // Build router
    let app = pawquest_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pawquest_api=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
