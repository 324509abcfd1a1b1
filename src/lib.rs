// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! PawQuest: walking adventures for kids and their grown-ups
//!
//! This crate provides the backend API for the PawQuest mobile app:
//! location-based challenges, rolling daily metrics, generated walk
//! stories, and the pet collection.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{
    ChallengeCatalog, DirectionsService, FirebaseAuthVerifier, MediaService, SpeechService,
    StoryService,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub catalog: ChallengeCatalog,
    pub identity: Arc<FirebaseAuthVerifier>,
    pub story: StoryService,
    pub speech: SpeechService,
    pub directions: DirectionsService,
    pub media: MediaService,
}
