//! Input records
//!
//! Task rows and reporter/user references as the dashboard store hands them
//! over. Every field is optional on the wire; malformed values degrade to
//! `None` instead of failing the whole row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// A `createdAt` value in any of the shapes the store produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Timestamp {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(default, alias = "_nanoseconds")]
        nanoseconds: u32,
    },
    EpochMillis(i64),
    Native(DateTime<Utc>),
    Text(String),
    Other(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub time_in_hours: Option<f64>,
    #[serde(rename = "timeSpentOnAI", default, deserialize_with = "lenient_f64")]
    pub time_spent_on_ai: Option<f64>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub ai_models: Vec<String>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub product: Option<String>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub market: Option<String>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateValue>,
    #[serde(rename = "reporterUID", default, deserialize_with = "lenient_id")]
    pub reporter_uid: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub reporter_id: Option<String>,
    #[serde(rename = "userUID", default, deserialize_with = "lenient_id")]
    pub user_uid: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub has_issues: bool,
}

impl TaskRecord {
    /// Logged hours; callers only see validated tasks so this is finite and non-negative.
    pub fn hours(&self) -> f64 {
        self.time_in_hours.unwrap_or(0.0)
    }

    /// AI hours, with missing, negative and non-finite values read as zero.
    pub fn ai_hours(&self) -> f64 {
        match self.time_spent_on_ai {
            Some(value) if value.is_finite() && value > 0.0 => value,
            _ => 0.0,
        }
    }

    pub fn is_ai_assisted(&self) -> bool {
        self.ai_hours() > 0.0
    }

    pub fn is_completed(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| status.trim().eq_ignore_ascii_case("completed"))
    }

    pub fn reporter_key(&self) -> Option<&str> {
        non_empty(&self.reporter_uid).or_else(|| non_empty(&self.reporter_id))
    }

    pub fn user_key(&self) -> Option<&str> {
        non_empty(&self.user_uid).or_else(|| non_empty(&self.user_id))
    }

    pub fn category_or<'a>(&'a self, default: &'a str) -> &'a str {
        non_empty(&self.category).unwrap_or(default)
    }

    pub fn product_or<'a>(&'a self, default: &'a str) -> &'a str {
        non_empty(&self.product).unwrap_or(default)
    }

    pub fn market_or<'a>(&'a self, default: &'a str) -> &'a str {
        non_empty(&self.market).unwrap_or(default)
    }
}

/// A reporter or user row, used only to put names on ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub uid: Option<String>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub email: Option<String>,
}

impl EntityRef {
    pub fn matches(&self, key: &str) -> bool {
        non_empty(&self.id) == Some(key) || non_empty(&self.uid) == Some(key)
    }

    pub fn label(&self) -> Option<&str> {
        non_empty(&self.name).or_else(|| non_empty(&self.display_name))
    }

    pub fn email(&self) -> Option<&str> {
        non_empty(&self.email)
    }
}

/// Best-effort lookup; `None` when no reference carries `key`.
pub fn find_entity<'a>(references: &'a [EntityRef], key: &str) -> Option<&'a EntityRef> {
    references.iter().find(|reference| reference.matches(key))
}

/// Build a task collection from arbitrary JSON.
///
/// Anything but an array yields no tasks; elements that are not objects, or
/// objects that do not fit the task shape, are skipped.
pub fn tasks_from_json(value: &Value) -> Vec<TaskRecord> {
    records_from_json(value, "task")
}

pub fn entities_from_json(value: &Value) -> Vec<EntityRef> {
    records_from_json(value, "entity")
}

fn records_from_json<T>(value: &Value, kind: &str) -> Vec<T>
where
    T: for<'de> Deserialize<'de>,
{
    let Some(items) = value.as_array() else {
        debug!(target: "taskpulse::records", kind, "input is not an array, treating as empty");
        return Vec::new();
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if !item.is_object() {
            debug!(target: "taskpulse::records", kind, index, "skipping non-object record");
            continue;
        }
        match serde_json::from_value::<T>(item.clone()) {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(target: "taskpulse::records", kind, index, error = %err, "skipping malformed record")
            }
        }
    }
    records
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    })
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

fn lenient_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}
