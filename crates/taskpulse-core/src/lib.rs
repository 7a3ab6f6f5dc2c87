#![deny(clippy::all)]

mod ai;
mod analytics;
mod base;
mod cards;
mod config;
mod entities;
mod error;
mod records;
pub mod registry;
mod summary;

pub use ai::*;
pub use analytics::*;
pub use base::*;
pub use cards::*;
pub use config::EngineConfig;
pub use entities::*;
pub use error::{AnalyticsError, Result};
pub use records::*;
pub use summary::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Totals shared by the whole-set summary, each category group and each day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTotals {
    pub total_tasks: u64,
    pub total_hours: f64,
    #[serde(rename = "totalTimeWithAI")]
    pub total_time_with_ai: f64,
    pub average_hours_per_task: f64,
    #[serde(rename = "tasksWithAI")]
    pub tasks_with_ai: u64,
    pub ai_usage_percentage: f64,
    pub completed_tasks: u64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAnalytics {
    pub efficiency: f64,
    pub productivity: f64,
    pub quality: f64,
    pub overall_score: f64,
}

/// Usage of one AI model (or one product/market among AI-assisted tasks).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiUsage {
    pub count: u64,
    pub total_time: f64,
    pub average_time: f64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalytics {
    #[serde(rename = "totalAITasks")]
    pub total_ai_tasks: u64,
    #[serde(rename = "totalAITime")]
    pub total_ai_time: f64,
    pub ai_usage_percentage: f64,
    #[serde(rename = "averageAITimePerTask")]
    pub average_ai_time_per_task: f64,
    pub ai_efficiency: f64,
    pub ai_cost_savings: f64,
    pub models: BTreeMap<String, AiUsage>,
    pub by_product: BTreeMap<String, AiUsage>,
    pub by_market: BTreeMap<String, AiUsage>,
}

/// Per-entity statistics produced by the reporter/product/market/user aggregators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityStats {
    pub id: String,
    pub name: String,
    pub email: String,
    pub total_tasks: u64,
    pub total_hours: f64,
    pub completed_tasks: u64,
    pub pending_tasks: u64,
    pub average_hours: f64,
    pub completion_rate: f64,
    pub unique_users: Vec<String>,
    pub unique_reporters: Vec<String>,
}

/// Fleet-wide rollup across every entity of one kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRollup {
    pub total_entities: u64,
    pub total_tasks: u64,
    pub total_hours: f64,
    pub average_tasks_per_entity: f64,
    pub average_hours_per_entity: f64,
    pub top_entity: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRollups {
    pub reporters: EntityRollup,
    pub products: EntityRollup,
    pub markets: EntityRollup,
    pub users: EntityRollup,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendBucket {
    pub count: u64,
    pub hours: f64,
    pub ai_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiTrendBucket {
    pub total_tasks: u64,
    pub ai_tasks: u64,
    pub ai_time: f64,
    pub ai_usage_percentage: f64,
}

/// Time-series buckets. Weekly keys are ISO weeks (`2025-W03`), daily keys are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trends {
    pub weekly: BTreeMap<String, TrendBucket>,
    pub daily: BTreeMap<String, TrendBucket>,
    /// category -> week -> bucket
    pub category_trends: BTreeMap<String, BTreeMap<String, TrendBucket>>,
    pub ai_trends: BTreeMap<String, AiTrendBucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub count: u64,
    pub hours: f64,
    pub ai_time: f64,
    pub completed_tasks: u64,
    pub categories: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopReporter {
    pub id: String,
    pub name: String,
    pub email: String,
    pub total_tasks: u64,
    pub total_hours: f64,
    pub completed_tasks: u64,
    pub completion_rate: f64,
    pub total_reporters: u64,
}

/// The full derived-metrics value for one task collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub month_id: String,
    pub user_id: Option<String>,
    pub summary: TaskTotals,
    pub categories: BTreeMap<String, TaskTotals>,
    pub performance: PerformanceAnalytics,
    pub markets: BTreeMap<String, EntityStats>,
    pub products: BTreeMap<String, EntityStats>,
    pub reporters: BTreeMap<String, EntityStats>,
    pub rollups: EntityRollups,
    pub ai_analytics: AiAnalytics,
    pub trends: Trends,
    pub daily_analytics: BTreeMap<String, DailyStats>,
    pub top_reporter: TopReporter,
    pub last_calculated: DateTime<Utc>,
    pub cache_key: String,
}

impl Analytics {
    /// Zero-valued result with every map empty and every number `0`.
    pub fn empty(month_id: &str, user_id: Option<&str>, cache_key: String) -> Self {
        Self {
            month_id: month_id.to_string(),
            user_id: user_id.map(str::to_string),
            summary: TaskTotals::default(),
            categories: BTreeMap::new(),
            performance: PerformanceAnalytics::default(),
            markets: BTreeMap::new(),
            products: BTreeMap::new(),
            reporters: BTreeMap::new(),
            rollups: EntityRollups::default(),
            ai_analytics: AiAnalytics::default(),
            trends: Trends::default(),
            daily_analytics: BTreeMap::new(),
            top_reporter: TopReporter::default(),
            last_calculated: Utc::now(),
            cache_key,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.total_tasks == 0
    }
}
