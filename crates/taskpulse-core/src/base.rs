//! Shared primitives for every calculator: validation, user filtering,
//! cache keys, date handling and rounding.

use crate::records::{DateValue, TaskRecord};
use crate::Analytics;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::borrow::Cow;

/// A task takes part in aggregation only with a finite, non-negative `timeInHours`.
pub fn validate_task(task: &TaskRecord) -> bool {
    matches!(task.time_in_hours, Some(hours) if hours.is_finite() && hours >= 0.0)
}

pub fn valid_tasks(tasks: &[TaskRecord]) -> impl Iterator<Item = &TaskRecord> {
    tasks.iter().filter(|task| validate_task(task))
}

/// Keep the tasks whose `userUID` or `userId` equals `user_id`; no filter borrows the input as is.
pub fn filter_tasks_by_user<'a>(
    tasks: &'a [TaskRecord],
    user_id: Option<&str>,
) -> Cow<'a, [TaskRecord]> {
    let Some(user_id) = normalize_user_id(user_id) else {
        return Cow::Borrowed(tasks);
    };

    Cow::Owned(
        tasks
            .iter()
            .filter(|task| {
                task.user_uid.as_deref().map(str::trim) == Some(user_id)
                    || task.user_id.as_deref().map(str::trim) == Some(user_id)
            })
            .cloned()
            .collect(),
    )
}

/// Trimmed user filter; blank means no filter.
pub fn normalize_user_id(user_id: Option<&str>) -> Option<&str> {
    user_id.map(str::trim).filter(|id| !id.is_empty())
}

/// Deterministic key for a `(tasks, month, user)` triple.
///
/// Format: `analytics:{month}:{user|all}:{sha256 prefix}`. The digest covers the
/// month, the user filter and the canonical JSON of every task in order.
pub fn generate_cache_key(tasks: &[TaskRecord], month_id: &str, user_id: Option<&str>) -> String {
    let user_id = normalize_user_id(user_id);
    let mut hasher = Sha256::new();
    hasher.update(month_id.as_bytes());
    hasher.update([0u8]);
    match user_id {
        Some(user_id) => {
            hasher.update([1u8]);
            hasher.update(user_id.as_bytes());
        }
        None => hasher.update([0u8]),
    }
    hasher.update((tasks.len() as u64).to_le_bytes());

    for task in tasks {
        let encoded = serde_json::to_vec(task).unwrap_or_default();
        hasher.update((encoded.len() as u64).to_le_bytes());
        hasher.update(&encoded);
    }

    let digest = hasher.finalize();
    let signature: String = digest.iter().take(16).map(|b| format!("{:02x}", b)).collect();

    format!(
        "analytics:{}:{}:{}",
        month_id,
        user_id.unwrap_or("all"),
        signature
    )
}

/// Tolerant date parsing; anything unrecognised is `None`.
pub fn parse_date(value: &DateValue) -> Option<DateTime<Utc>> {
    match value {
        DateValue::Timestamp {
            seconds,
            nanoseconds,
        } => DateTime::from_timestamp(*seconds, *nanoseconds),
        DateValue::EpochMillis(millis) => DateTime::from_timestamp_millis(*millis),
        DateValue::Native(date) => Some(*date),
        DateValue::Text(text) => parse_date_str(text),
        DateValue::Other(Value::Number(number)) => number
            .as_f64()
            .filter(|millis| millis.is_finite())
            .and_then(|millis| DateTime::from_timestamp_millis(millis as i64)),
        DateValue::Other(_) => None,
    }
}

pub fn parse_date_str(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// ISO-8601 week bucket, e.g. `2025-W03`. Uses the ISO week-year.
pub fn get_week_key(date: &DateTime<Utc>) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

pub fn get_day_key(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn get_empty_analytics(month_id: &str, user_id: Option<&str>) -> Analytics {
    let user_id = normalize_user_id(user_id);
    Analytics::empty(month_id, user_id, generate_cache_key(&[], month_id, user_id))
}

/// Two decimals. Values too large to scale are already whole and pass through.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        value
    }
}

/// `numerator / denominator` to two decimals, `0` on an empty denominator.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        round2(numerator / denominator)
    }
}

/// Whole-number percentage clamped to `[0, 100]`, `0` when `whole` is zero.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (100.0 * part as f64 / whole as f64).round().clamp(0.0, 100.0)
}
