// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge catalog types and completion inference over run records.
//!
//! Run records are loosely typed: several client generations wrote
//! different shapes (`variants` maps with booleans, objects with
//! `completed` flags or `completedAt` timestamps, and an old single
//! `variant` string). Inference here is the single reader for all of
//! them; nothing downstream touches the raw record.

use serde::{Deserialize, Serialize};
use serde_json::Value;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A challenge definition from the static catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Area or landmark the route starts from
    pub area: String,
    /// Start coordinate, `[lon, lat]`
    pub start: [f64; 2],
    pub variants: ChallengeVariants,
    /// Pet awarded when both variants are complete
    #[serde(default)]
    pub reward_pet: Option<String>,
}

/// Per-difficulty targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct ChallengeVariants {
    pub easy: VariantSpec,
    pub hard: VariantSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct VariantSpec {
    pub distance_meters: f64,
    pub reward_xp: u32,
}

/// Difficulty tier of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantName {
    Easy,
    Hard,
}

impl VariantName {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantName::Easy => "easy",
            VariantName::Hard => "hard",
        }
    }

    /// Case-insensitive parse, matching how legacy records spell it.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Some(VariantName::Easy),
            "hard" => Some(VariantName::Hard),
            _ => None,
        }
    }
}

/// Completion flags inferred from a run record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct VariantCompletion {
    pub easy: bool,
    pub hard: bool,
}

/// Derive `{easy, hard}` flags from an arbitrary run record.
///
/// A variant counts as complete when `variants.<name>` is the literal
/// `true`, an object with `completed` set to the literal boolean `true`,
/// or an object with a truthy `completedAt`. The legacy single `variant`
/// string is consulted only when the map marked neither variant.
pub fn extract_variant_completion(record: &Value) -> VariantCompletion {
    let mut completion = VariantCompletion {
        easy: variant_complete(record, "easy"),
        hard: variant_complete(record, "hard"),
    };

    if !completion.easy && !completion.hard {
        if let Some(legacy) = record.get("variant").and_then(Value::as_str) {
            match legacy.to_ascii_lowercase().as_str() {
                "easy" => completion.easy = true,
                "hard" => completion.hard = true,
                _ => {}
            }
        }
    }

    completion
}

/// A challenge is fully locked once both variants are complete.
pub fn is_challenge_fully_locked(completion: VariantCompletion) -> bool {
    completion.easy && completion.hard
}

fn variant_complete(record: &Value, name: &str) -> bool {
    let Some(entry) = record.get("variants").and_then(|v| v.get(name)) else {
        return false;
    };
    match entry {
        Value::Bool(flag) => *flag,
        Value::Object(fields) => {
            // `completed` must be a literal boolean; "yes" does not count.
            fields
                .get("completed")
                .and_then(Value::as_bool)
                .unwrap_or(false)
                || fields.get("completedAt").is_some_and(is_truthy)
        }
        _ => false,
    }
}

/// Truthiness as the legacy clients understood it: null, false, 0 and
/// the empty string are falsy, everything else is truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Merge a new completion into a loose run record, in place.
///
/// Returns `false` when the variant was already complete; the original
/// `completedAt` is preserved in that case. A completion carried only by
/// the legacy `variant` string is first materialized into the `variants`
/// map so it survives the other variant being added.
pub fn apply_variant_completion(
    record: &mut Value,
    variant: VariantName,
    completed_at: &str,
    duration_secs: Option<f64>,
    distance_meters: Option<f64>,
) -> bool {
    if !record.is_object() {
        *record = Value::Object(serde_json::Map::new());
    }

    let before = extract_variant_completion(record);
    let map_easy = variant_complete(record, "easy");
    let map_hard = variant_complete(record, "hard");
    if before.easy && !map_easy {
        set_variant_entry(record, "easy", serde_json::json!({ "completed": true }));
    }
    if before.hard && !map_hard {
        set_variant_entry(record, "hard", serde_json::json!({ "completed": true }));
    }

    let already = match variant {
        VariantName::Easy => before.easy,
        VariantName::Hard => before.hard,
    };
    if already {
        return false;
    }

    let mut entry = serde_json::Map::new();
    entry.insert("completed".to_string(), Value::Bool(true));
    entry.insert(
        "completedAt".to_string(),
        Value::String(completed_at.to_string()),
    );
    if let Some(duration) = duration_secs {
        entry.insert("duration_secs".to_string(), serde_json::json!(duration));
    }
    if let Some(distance) = distance_meters {
        entry.insert("distance_meters".to_string(), serde_json::json!(distance));
    }
    set_variant_entry(record, variant.as_str(), Value::Object(entry));
    true
}

fn set_variant_entry(record: &mut Value, name: &str, entry: Value) {
    let obj = record
        .as_object_mut()
        .expect("run record coerced to object above");
    let variants = obj
        .entry("variants".to_string())
        .or_insert_with(|| Value::Object(serde_json::Map::new()));
    if !variants.is_object() {
        *variants = Value::Object(serde_json::Map::new());
    }
    variants
        .as_object_mut()
        .expect("variants coerced to object above")
        .insert(name.to_string(), entry);
}
