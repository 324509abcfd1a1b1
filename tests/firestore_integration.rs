// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Run with: ./scripts/test-with-emulator.sh
//!
//! The emulator provides a clean state for each test run.

use pawquest_api::models::challenge::VariantName;
use pawquest_api::models::{MergeMode, MetricKind, StoryRecord, UserProfile};
use pawquest_api::time_utils::parse_day_key;

mod common;
use common::{test_catalog, test_db};

/// Generate a unique uid for test isolation.
fn unique_uid(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

/// Helper to create a basic test profile
fn test_profile(uid: &str) -> UserProfile {
    UserProfile::new_from_login(
        uid,
        Some("test@example.com".to_string()),
        Some("Test Explorer".to_string()),
        None,
        "2026-01-15T10:00:00Z",
    )
}

fn day(key: &str) -> chrono::NaiveDate {
    parse_day_key(key).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// USER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_new_profile_creation() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid("user");

    // Initially, profile should not exist
    let before = db.get_user(&uid).await.unwrap();
    assert!(before.is_none(), "Profile should not exist before creation");

    db.upsert_user(&test_profile(&uid)).await.unwrap();

    let after = db.get_user(&uid).await.unwrap();
    assert!(after.is_some(), "Profile should exist after creation");

    let fetched = after.unwrap();
    assert_eq!(fetched.uid, uid);
    assert_eq!(fetched.display_name, "Test Explorer");
    assert_eq!(fetched.email, Some("test@example.com".to_string()));
    assert_eq!(fetched.role, "user");

    println!("✓ New profile created and verified: uid={}", uid);
}

#[tokio::test]
async fn test_profile_update_preserves_created_at() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid("user");

    let mut profile = test_profile(&uid);
    db.upsert_user(&profile).await.unwrap();

    let update = pawquest_api::models::UpdateProfileRequest {
        display_name: Some("Renamed Explorer".to_string()),
        age: Some(9),
        ..Default::default()
    };
    profile.apply_update(&update, "2026-03-09T12:00:00Z");
    db.upsert_user(&profile).await.unwrap();

    let fetched = db.get_user(&uid).await.unwrap().unwrap();
    assert_eq!(fetched.display_name, "Renamed Explorer");
    assert_eq!(fetched.age, Some(9));
    // created_at should match original
    assert_eq!(fetched.created_at, "2026-01-15T10:00:00Z");
    assert_eq!(fetched.updated_at, "2026-03-09T12:00:00Z");

    println!("✓ Profile update verified: uid={}", uid);
}

// ═══════════════════════════════════════════════════════════════════════════
// METRIC TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_metric_replace_then_sum() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid("metrics");
    let today = day("2026-03-09");

    let window = db
        .upsert_daily_metric(&uid, MetricKind::Steps, today, 10.0, MergeMode::Replace)
        .await
        .unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].value, 10.0);

    let window = db
        .upsert_daily_metric(&uid, MetricKind::Steps, today, 5.0, MergeMode::Sum)
        .await
        .unwrap();
    assert_eq!(window[0].value, 15.0);

    // Replace overwrites the accumulated value
    let window = db
        .upsert_daily_metric(&uid, MetricKind::Steps, today, 3.0, MergeMode::Replace)
        .await
        .unwrap();
    assert_eq!(window[0].value, 3.0);

    println!("✓ Replace-then-sum verified: uid={}", uid);
}

#[tokio::test]
async fn test_metric_clamps_negative_totals() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid("metrics");
    let today = day("2026-03-09");

    db.upsert_daily_metric(&uid, MetricKind::Calories, today, 100.0, MergeMode::Replace)
        .await
        .unwrap();
    let window = db
        .upsert_daily_metric(&uid, MetricKind::Calories, today, -500.0, MergeMode::Sum)
        .await
        .unwrap();

    assert_eq!(window[0].value, 0.0, "Negative totals clamp to zero");
}

#[tokio::test]
async fn test_metric_window_prunes_old_entries() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid("metrics");

    // Write three days, anchored at the newest
    for (key, value) in [
        ("2026-03-01", 1.0),
        ("2026-03-05", 5.0),
        ("2026-03-09", 9.0),
    ] {
        db.upsert_daily_metric(&uid, MetricKind::Steps, day(key), value, MergeMode::Replace)
            .await
            .unwrap();
    }

    // Anchored at 03-09, the 03-01 entry is outside the 7-day window
    let window = db
        .get_metric_window(&uid, MetricKind::Steps, day("2026-03-09"))
        .await
        .unwrap();
    let dates: Vec<&str> = window.iter().map(|e| e.date.as_str()).collect();
    assert_eq!(dates, vec!["2026-03-05", "2026-03-09"]);

    // Reading much later re-filters the stored document down to nothing
    let window = db
        .get_metric_window(&uid, MetricKind::Steps, day("2026-06-01"))
        .await
        .unwrap();
    assert!(window.is_empty(), "Stale entries never reach a client");

    println!("✓ Window pruning verified: uid={}", uid);
}

#[tokio::test]
async fn test_metrics_are_isolated_per_kind() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid("metrics");
    let today = day("2026-03-09");

    db.upsert_daily_metric(&uid, MetricKind::Steps, today, 4000.0, MergeMode::Replace)
        .await
        .unwrap();
    db.upsert_daily_metric(&uid, MetricKind::Calories, today, 250.0, MergeMode::Replace)
        .await
        .unwrap();

    let steps = db
        .get_metric_window(&uid, MetricKind::Steps, today)
        .await
        .unwrap();
    let calories = db
        .get_metric_window(&uid, MetricKind::Calories, today)
        .await
        .unwrap();

    assert_eq!(steps[0].value, 4000.0);
    assert_eq!(calories[0].value, 250.0);
}

// ═══════════════════════════════════════════════════════════════════════════
// CHALLENGE RUN TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_variant_completion_lifecycle() {
    require_emulator!();

    let db = test_db().await;
    let catalog = test_catalog();
    let uid = unique_uid("runs");
    let challenge = catalog.challenge("riverside-loop").unwrap();

    // Easy first: new completion, challenge not yet locked, no pet
    let outcome = db
        .complete_challenge_variant(&uid, challenge, VariantName::Easy, Some(900.0), Some(1250.0))
        .await
        .unwrap();
    assert!(outcome.newly_completed);
    assert!(outcome.completion.easy);
    assert!(!outcome.completion.hard);
    assert!(outcome.awarded_pet.is_none());

    // Hard second: locks the challenge, awards the pet
    let outcome = db
        .complete_challenge_variant(&uid, challenge, VariantName::Hard, None, None)
        .await
        .unwrap();
    assert!(outcome.newly_completed);
    assert!(outcome.completion.easy && outcome.completion.hard);
    let pet = outcome.awarded_pet.expect("locking must award the pet");
    assert_eq!(pet.pet_id, "luna-husky");
    assert_eq!(pet.source_challenge, "riverside-loop");

    // Repeating hard is a no-op: no new completion, no second award
    let outcome = db
        .complete_challenge_variant(&uid, challenge, VariantName::Hard, None, None)
        .await
        .unwrap();
    assert!(!outcome.newly_completed);
    assert!(outcome.awarded_pet.is_none());
    assert!(outcome.completion.easy && outcome.completion.hard);

    let pets = db.get_user_pets(&uid).await.unwrap();
    assert_eq!(pets.len(), 1, "Pet must be awarded exactly once");

    println!("✓ Completion lifecycle verified: uid={}", uid);
}

#[tokio::test]
async fn test_completion_without_reward_pet() {
    require_emulator!();

    let db = test_db().await;
    let catalog = test_catalog();
    let uid = unique_uid("runs");
    let challenge = catalog.challenge("meadow-sprint").unwrap();

    db.complete_challenge_variant(&uid, challenge, VariantName::Easy, None, None)
        .await
        .unwrap();
    let outcome = db
        .complete_challenge_variant(&uid, challenge, VariantName::Hard, None, None)
        .await
        .unwrap();

    assert!(outcome.completion.easy && outcome.completion.hard);
    assert!(outcome.awarded_pet.is_none(), "No reward pet configured");
    assert!(db.get_user_pets(&uid).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_run_records_listing() {
    require_emulator!();

    let db = test_db().await;
    let catalog = test_catalog();
    let uid = unique_uid("runs");

    db.complete_challenge_variant(
        &uid,
        catalog.challenge("riverside-loop").unwrap(),
        VariantName::Easy,
        None,
        None,
    )
    .await
    .unwrap();

    let runs = db.get_run_records_for_user(&uid).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].challenge_id(&uid), Some("riverside-loop"));

    // The single run record is also readable by id
    let record = db.get_run_record(&uid, "riverside-loop").await.unwrap();
    assert!(record.is_some());
}

// ═══════════════════════════════════════════════════════════════════════════
// STORY TESTS
// ═══════════════════════════════════════════════════════════════════════════

fn test_story(uid: &str, suffix: &str, created_at: &str) -> StoryRecord {
    StoryRecord {
        id: format!("{uid}_{suffix}"),
        uid: uid.to_string(),
        title: "Luna and the Lost Lantern".to_string(),
        text: "Once upon a time...".to_string(),
        choices: pawquest_api::models::StoryChoices {
            hero: "Luna".to_string(),
            companion: "a brave beagle".to_string(),
            setting: "the foggy ridge".to_string(),
            goal: "Lost Lantern".to_string(),
            tone: "calm".to_string(),
            duration_minutes: 10,
        },
        voice_id: None,
        created_at: created_at.to_string(),
    }
}

#[tokio::test]
async fn test_story_crud_and_ownership() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid("stories");
    let other_uid = unique_uid("stories-other");

    let first = test_story(&uid, "1", "2026-03-08T10:00:00Z");
    let second = test_story(&uid, "2", "2026-03-09T10:00:00Z");
    db.insert_story(&first).await.unwrap();
    db.insert_story(&second).await.unwrap();

    // Listing is newest first
    let stories = db.get_stories_for_user(&uid).await.unwrap();
    assert_eq!(stories.len(), 2);
    assert_eq!(stories[0].id, second.id);
    assert_eq!(stories[1].id, first.id);

    // Ownership: another user cannot read or delete the story
    assert!(db.get_story(&uid, &first.id).await.unwrap().is_some());
    assert!(db.get_story(&other_uid, &first.id).await.unwrap().is_none());
    assert!(!db.delete_story(&other_uid, &first.id).await.unwrap());
    assert!(db.get_story(&uid, &first.id).await.unwrap().is_some());

    // Owner delete works and is reported
    assert!(db.delete_story(&uid, &first.id).await.unwrap());
    assert!(db.get_story(&uid, &first.id).await.unwrap().is_none());
    assert!(!db.delete_story(&uid, &first.id).await.unwrap());

    println!("✓ Story CRUD and ownership verified: uid={}", uid);
}
