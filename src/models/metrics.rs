//! Rolling 7-day metric window over loosely-typed stored entries.
//!
//! Metric documents were historically written by several client versions,
//! so the stored `entries` array is treated as untrusted JSON: anything
//! that does not parse as a `{date, value}` pair with a `YYYY-MM-DD` date
//! key is dropped silently by the pruning filter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::{format_day_key, parse_day_key};

/// Window length in calendar days, counting the anchor date itself.
pub const WINDOW_DAYS: i64 = 7;

/// Metrics tracked per user, one document each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Steps,
    Calories,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Steps => "steps",
            MetricKind::Calories => "calories",
        }
    }

    /// Parse a path parameter. Unknown metrics are a 404 at the API layer.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "steps" => Some(MetricKind::Steps),
            "calories" => Some(MetricKind::Calories),
            _ => None,
        }
    }
}

/// How an upsert combines with the value already stored for the date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    Replace,
    Sum,
}

/// One well-formed day entry, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct DailyEntry {
    /// Local-calendar day key (`YYYY-MM-DD`)
    pub date: String,
    pub value: f64,
}

/// Per-user, per-metric document as stored in Firestore.
///
/// Stored at: `userMetrics/{uid}_{metric}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricDocument {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub metric: String,
    /// Raw entries; may contain malformed legacy shapes
    #[serde(default)]
    pub entries: Vec<Value>,
    /// Last write timestamp (ISO 8601)
    #[serde(default)]
    pub updated_at: String,
}

impl MetricDocument {
    /// Build the canonical document for a merged window.
    pub fn from_window(uid: &str, metric: MetricKind, window: &[DailyEntry], now: &str) -> Self {
        Self {
            uid: uid.to_string(),
            metric: metric.as_str().to_string(),
            entries: window
                .iter()
                .map(|e| serde_json::json!({ "date": e.date, "value": e.value }))
                .collect(),
            updated_at: now.to_string(),
        }
    }
}

/// Apply the 7-day filter to stored entries and return the well-formed
/// window, sorted ascending by date key.
///
/// Malformed entries are dropped; duplicate dates collapse to the last
/// occurrence. Entries dated after the anchor are kept: only age prunes.
pub fn prune_window(entries: &[Value], anchor: chrono::NaiveDate) -> Vec<DailyEntry> {
    to_entries(window_map(entries, anchor))
}

/// Merge one day's value into the stored entries and return the new
/// window. The result for the merged date is clamped to be non-negative.
pub fn merge_daily_value(
    entries: &[Value],
    day: chrono::NaiveDate,
    value: f64,
    mode: MergeMode,
) -> Vec<DailyEntry> {
    let mut window = window_map(entries, day);
    let merged = match mode {
        MergeMode::Replace => value,
        MergeMode::Sum => window.get(&day).copied().unwrap_or(0.0) + value,
    };
    window.insert(day, merged.max(0.0));
    to_entries(window)
}

/// Parse the loose array into a date-keyed map, dropping anything older
/// than 6 days before the anchor. BTreeMap ordering gives the ascending
/// sort; inserts make the last stored occurrence of a date win.
fn window_map(entries: &[Value], anchor: chrono::NaiveDate) -> BTreeMap<chrono::NaiveDate, f64> {
    let cutoff = anchor - chrono::Duration::days(WINDOW_DAYS - 1);
    let mut window = BTreeMap::new();
    for raw in entries {
        if let Some((date, value)) = parse_entry(raw) {
            if date >= cutoff {
                window.insert(date, value);
            }
        }
    }
    window
}

fn to_entries(window: BTreeMap<chrono::NaiveDate, f64>) -> Vec<DailyEntry> {
    window
        .into_iter()
        .map(|(date, value)| DailyEntry {
            date: format_day_key(date),
            value,
        })
        .collect()
}

/// Loose parse of one stored entry. `date` must be a string day key
/// (never a timestamp) and `value` a JSON number; anything else is
/// treated as malformed and skipped.
fn parse_entry(raw: &Value) -> Option<(chrono::NaiveDate, f64)> {
    let obj = raw.as_object()?;
    let date = parse_day_key(obj.get("date")?.as_str()?)?;
    let value = obj.get("value")?.as_f64()?;
    Some((date, value))
}
