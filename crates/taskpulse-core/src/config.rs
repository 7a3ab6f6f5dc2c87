//! Tunable constants of the aggregation engine.
//!
//! The defaults are the figures the dashboard has always shipped with. None of
//! them is measured; teams override them from `config.toml`.

use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fraction of a task's AI time assumed to be saved wall-clock time.
    pub ai_time_savings_ratio: f64,
    /// Hourly cost used to price saved time.
    pub hourly_rate: f64,
    /// Base points in the per-model efficiency heuristic.
    pub base_model_efficiency: f64,
    pub efficiency_weight: f64,
    pub productivity_weight: f64,
    pub quality_weight: f64,
    /// Total hours are divided by this before weighting.
    pub productivity_scale: f64,
    pub default_category: String,
    pub unknown_entity: String,
    pub unknown_reporter: String,
    pub unknown_user: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ai_time_savings_ratio: 0.3,
            hourly_rate: 50.0,
            base_model_efficiency: 75.0,
            efficiency_weight: 0.4,
            productivity_weight: 0.3,
            quality_weight: 0.3,
            productivity_scale: 10.0,
            default_category: "uncategorized".to_string(),
            unknown_entity: "unknown".to_string(),
            unknown_reporter: "Unknown Reporter".to_string(),
            unknown_user: "Unknown User".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
