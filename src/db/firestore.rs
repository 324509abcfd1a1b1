// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage)
//! - Metrics (rolling 7-day windows, transactional upsert)
//! - Challenge runs (loose records, transactional completion + pet award)
//! - Pets (awarded collectibles)
//! - Stories (saved narratives)

use futures_util::{stream, StreamExt};
use serde_json::Value;

use crate::db::collections;
use crate::error::AppError;
use crate::models::challenge::{
    apply_variant_completion, extract_variant_completion, is_challenge_fully_locked, Challenge,
    VariantCompletion, VariantName,
};
use crate::models::metrics::{merge_daily_value, prune_window};
use crate::models::{DailyEntry, MergeMode, MetricDocument, MetricKind};
use crate::models::{StoryRecord, UserPet, UserProfile};
use crate::time_utils::format_utc_rfc3339;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Result of recording a challenge completion.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    /// Flags after the write
    pub completion: VariantCompletion,
    /// False when the variant was already complete (idempotent repeat)
    pub newly_completed: bool,
    /// Set when this completion transitioned the challenge to fully locked
    pub awarded_pet: Option<UserPet>,
}

/// A loose run record together with its document id, for queries that
/// need to correlate records back to catalog challenges.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RunDocument {
    #[serde(rename = "_firestore_id")]
    pub doc_id: String,
    #[serde(flatten)]
    pub record: Value,
}

impl RunDocument {
    /// Challenge id from the composite document id (`{uid}_{challenge}`).
    pub fn challenge_id<'a>(&'a self, uid: &str) -> Option<&'a str> {
        self.doc_id.strip_prefix(uid)?.strip_prefix('_')
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Whether a Firestore connection is configured (false in mock mode).
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user profile by uid.
    pub async fn get_user(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user profile.
    pub async fn upsert_user(&self, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&profile.uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Metric Operations ───────────────────────────────────────

    /// Read a metric window, re-applying the 7-day filter so stale stored
    /// entries never reach a client.
    pub async fn get_metric_window(
        &self,
        uid: &str,
        metric: MetricKind,
        anchor: chrono::NaiveDate,
    ) -> Result<Vec<DailyEntry>, AppError> {
        let doc: Option<MetricDocument> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_METRICS)
            .obj()
            .one(metric_doc_id(uid, metric))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(doc
            .map(|d| prune_window(&d.entries, anchor))
            .unwrap_or_default())
    }

    /// Merge one day's value into a metric document.
    ///
    /// Runs as a serializable read-modify-write: the stored entries are
    /// read inside the transaction, merged and pruned in memory, and
    /// written back. Contention with concurrent writers on the same
    /// document is retried by the transaction runner, so no update is
    /// lost. Returns the new window.
    pub async fn upsert_daily_metric(
        &self,
        uid: &str,
        metric: MetricKind,
        day: chrono::NaiveDate,
        value: f64,
        mode: MergeMode,
    ) -> Result<Vec<DailyEntry>, AppError> {
        let client = self.get_client()?;
        let doc_id = metric_doc_id(uid, metric);
        let uid = uid.to_string();

        let window = client
            .run_transaction(|db, transaction| {
                let doc_id = doc_id.clone();
                let uid = uid.clone();
                Box::pin(async move {
                    let stored: Option<MetricDocument> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USER_METRICS)
                        .obj()
                        .one(&doc_id)
                        .await?;

                    let entries = stored.map(|d| d.entries).unwrap_or_default();
                    let window = merge_daily_value(&entries, day, value, mode);

                    let now = format_utc_rfc3339(chrono::Utc::now());
                    let doc = MetricDocument::from_window(&uid, metric, &window, &now);
                    db.fluent()
                        .update()
                        .in_col(collections::USER_METRICS)
                        .document_id(&doc_id)
                        .object(&doc)
                        .add_to_transaction(transaction)?;

                    Ok(window)
                })
            })
            .await
            .map_err(|e| AppError::Database(format!("Metric upsert failed: {}", e)))?;

        tracing::debug!(
            uid = %uid,
            metric = metric.as_str(),
            day = %day,
            "Metric window updated"
        );

        Ok(window)
    }

    // ─── Challenge Run Operations ────────────────────────────────

    /// Get the raw run record for one challenge, if any.
    pub async fn get_run_record(
        &self,
        uid: &str,
        challenge_id: &str,
    ) -> Result<Option<Value>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CHALLENGE_RUNS)
            .obj()
            .one(run_doc_id(uid, challenge_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all of a user's run records, with their document ids.
    pub async fn get_run_records_for_user(&self, uid: &str) -> Result<Vec<RunDocument>, AppError> {
        let uid = uid.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CHALLENGE_RUNS)
            .filter(move |q| q.for_all([q.field("uid").eq(&uid)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record a variant completion and award the reward pet when the
    /// challenge transitions to fully locked.
    ///
    /// The run record is read inside a transaction, merged in memory and
    /// written back together with the pet award, so two racing completion
    /// requests cannot both observe the transition. Re-completing an
    /// already-complete variant writes nothing and keeps the original
    /// `completedAt`.
    pub async fn complete_challenge_variant(
        &self,
        uid: &str,
        challenge: &Challenge,
        variant: VariantName,
        duration_secs: Option<f64>,
        distance_meters: Option<f64>,
    ) -> Result<CompletionOutcome, AppError> {
        let client = self.get_client()?;
        let uid = uid.to_string();
        let challenge_id = challenge.id.clone();
        let reward_pet = challenge.reward_pet.clone();

        let outcome = client
            .run_transaction(|db, transaction| {
                let uid = uid.clone();
                let challenge_id = challenge_id.clone();
                let reward_pet = reward_pet.clone();
                Box::pin(async move {
                    let doc_id = run_doc_id(&uid, &challenge_id);
                    let stored: Option<Value> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::CHALLENGE_RUNS)
                        .obj()
                        .one(&doc_id)
                        .await?;

                    let mut record = stored.unwrap_or_else(|| serde_json::json!({}));
                    let locked_before =
                        is_challenge_fully_locked(extract_variant_completion(&record));

                    let now = format_utc_rfc3339(chrono::Utc::now());
                    let newly_completed = apply_variant_completion(
                        &mut record,
                        variant,
                        &now,
                        duration_secs,
                        distance_meters,
                    );
                    let completion = extract_variant_completion(&record);

                    if !newly_completed {
                        return Ok(CompletionOutcome {
                            completion,
                            newly_completed: false,
                            awarded_pet: None,
                        });
                    }

                    // Keep canonical addressing fields on the record so
                    // queries by uid keep working for upgraded legacy docs.
                    record["uid"] = serde_json::json!(uid);
                    record["challenge_id"] = serde_json::json!(challenge_id);
                    record["updated_at"] = serde_json::json!(now);

                    db.fluent()
                        .update()
                        .in_col(collections::CHALLENGE_RUNS)
                        .document_id(&doc_id)
                        .object(&record)
                        .add_to_transaction(transaction)?;

                    let mut awarded_pet = None;
                    if is_challenge_fully_locked(completion) && !locked_before {
                        if let Some(pet_id) = reward_pet {
                            let pet = UserPet {
                                uid: uid.clone(),
                                pet_id: pet_id.clone(),
                                source_challenge: challenge_id.clone(),
                                awarded_at: now.clone(),
                            };
                            db.fluent()
                                .update()
                                .in_col(collections::USER_PETS)
                                .document_id(pet_doc_id(&uid, &pet_id))
                                .object(&pet)
                                .add_to_transaction(transaction)?;
                            awarded_pet = Some(pet);
                        }
                    }

                    Ok(CompletionOutcome {
                        completion,
                        newly_completed: true,
                        awarded_pet,
                    })
                })
            })
            .await
            .map_err(|e| AppError::Database(format!("Completion write failed: {}", e)))?;

        if let Some(pet) = &outcome.awarded_pet {
            tracing::info!(
                uid = %uid,
                challenge = %challenge_id,
                pet = %pet.pet_id,
                "Challenge fully locked, pet awarded"
            );
        }

        Ok(outcome)
    }

    // ─── Pet Operations ──────────────────────────────────────────

    /// Get all pets awarded to a user, newest first.
    pub async fn get_user_pets(&self, uid: &str) -> Result<Vec<UserPet>, AppError> {
        let uid = uid.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USER_PETS)
            .filter(move |q| q.for_all([q.field("uid").eq(&uid)]))
            .order_by([(
                "awarded_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Story Operations ────────────────────────────────────────

    /// Persist a story document.
    pub async fn insert_story(&self, story: &StoryRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::STORIES)
            .document_id(&story.id)
            .object(story)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get a story by id, checking ownership.
    pub async fn get_story(&self, uid: &str, story_id: &str) -> Result<Option<StoryRecord>, AppError> {
        let story: Option<StoryRecord> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::STORIES)
            .obj()
            .one(story_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(story.filter(|s| s.uid == uid))
    }

    /// Get a user's stories, newest first.
    pub async fn get_stories_for_user(&self, uid: &str) -> Result<Vec<StoryRecord>, AppError> {
        let uid = uid.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::STORIES)
            .filter(move |q| q.for_all([q.field("uid").eq(&uid)]))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a story. Returns false when it does not exist or belongs to
    /// someone else.
    pub async fn delete_story(&self, uid: &str, story_id: &str) -> Result<bool, AppError> {
        if self.get_story(uid, story_id).await?.is_none() {
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::STORIES)
            .document_id(story_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Delete documents concurrently with a limit to avoid overloading
    /// Firestore.
    async fn delete_docs_concurrently(
        &self,
        collection: &str,
        doc_ids: Vec<String>,
    ) -> Result<usize, AppError> {
        let client = self.get_client()?;
        let count = doc_ids.len();

        stream::iter(doc_ids)
            .map(|doc_id| async move {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(count)
    }

    // ─── User Data Deletion (GDPR) ─────────────────────────────────

    /// Delete ALL data for a user (GDPR compliance).
    ///
    /// Deletes from all collections:
    /// - `challengeRuns` (query by uid)
    /// - `userPets` (query by uid)
    /// - `stories` (query by uid)
    /// - `userMetrics/{uid}_{metric}` for every metric
    /// - `users/{uid}`
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_user_data(&self, uid: &str) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        // 1. Delete run records
        let runs = self.get_run_records_for_user(uid).await?;
        let count = self
            .delete_docs_concurrently(
                collections::CHALLENGE_RUNS,
                runs.into_iter().map(|r| r.doc_id).collect(),
            )
            .await?;
        deleted_count += count;
        tracing::debug!(uid, count, "Deleted run records");

        // 2. Delete awarded pets
        let pets = self.get_user_pets(uid).await?;
        let count = self
            .delete_docs_concurrently(
                collections::USER_PETS,
                pets.iter().map(|p| pet_doc_id(uid, &p.pet_id)).collect(),
            )
            .await?;
        deleted_count += count;
        tracing::debug!(uid, count, "Deleted pets");

        // 3. Delete stories
        let stories = self.get_stories_for_user(uid).await?;
        let count = self
            .delete_docs_concurrently(
                collections::STORIES,
                stories.into_iter().map(|s| s.id).collect(),
            )
            .await?;
        deleted_count += count;
        tracing::debug!(uid, count, "Deleted stories");

        // 4. Delete metric documents (fixed ids, deletes are idempotent)
        for metric in [MetricKind::Steps, MetricKind::Calories] {
            self.get_client()?
                .fluent()
                .delete()
                .from(collections::USER_METRICS)
                .document_id(metric_doc_id(uid, metric))
                .execute()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            deleted_count += 1;
        }
        tracing::debug!(uid, "Deleted metric documents");

        // 5. Delete user profile
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(uid)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        deleted_count += 1;
        tracing::debug!(uid, "Deleted user profile");

        tracing::info!(uid, deleted_count, "User data deletion complete");

        Ok(deleted_count)
    }
}

/// Metric document id: `{uid}_{metric}`.
pub fn metric_doc_id(uid: &str, metric: MetricKind) -> String {
    format!("{}_{}", uid, metric.as_str())
}

/// Run record document id: `{uid}_{challenge_id}`.
pub fn run_doc_id(uid: &str, challenge_id: &str) -> String {
    format!("{}_{}", uid, challenge_id)
}

/// Pet award document id: `{uid}_{pet_id}`.
pub fn pet_doc_id(uid: &str, pet_id: &str) -> String {
    format!("{}_{}", uid, pet_id)
}
