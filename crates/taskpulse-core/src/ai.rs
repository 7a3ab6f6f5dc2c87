//! AI-usage analytics
//!
//! A task is AI-assisted when `timeSpentOnAI > 0`. The efficiency and savings
//! figures are heuristics driven by [`EngineConfig`], not measurements.

use crate::base::{percentage, ratio, round2, valid_tasks};
use crate::config::EngineConfig;
use crate::records::TaskRecord;
use crate::{AiAnalytics, AiUsage};
use std::collections::{BTreeMap, BTreeSet};

pub fn calculate_ai_analytics(tasks: &[TaskRecord], config: &EngineConfig) -> AiAnalytics {
    let mut total_tasks = 0u64;
    let mut ai_tasks = 0u64;
    let mut ai_time = 0.0;
    let mut efficiency_sum = 0.0;
    let mut savings = 0.0;

    let mut models = UsageGroups::default();
    let mut by_product = UsageGroups::default();
    let mut by_market = UsageGroups::default();

    for task in valid_tasks(tasks) {
        total_tasks += 1;
        let ai_hours = task.ai_hours();
        if ai_hours <= 0.0 {
            continue;
        }

        ai_tasks += 1;
        ai_time += ai_hours;
        efficiency_sum += task_efficiency(task.hours(), ai_hours, config);
        savings += ai_hours * config.ai_time_savings_ratio * config.hourly_rate;

        let referenced: BTreeSet<&str> = task
            .ai_models
            .iter()
            .map(|model| model.trim())
            .filter(|model| !model.is_empty())
            .collect();
        for model in referenced {
            models.add(model, ai_hours);
        }
        by_product.add(task.product_or(&config.unknown_entity), ai_hours);
        by_market.add(task.market_or(&config.unknown_entity), ai_hours);
    }

    let total_ai_time = round2(ai_time);
    AiAnalytics {
        total_ai_tasks: ai_tasks,
        total_ai_time,
        ai_usage_percentage: percentage(ai_tasks, total_tasks),
        average_ai_time_per_task: ratio(total_ai_time, ai_tasks as f64),
        ai_efficiency: ratio(efficiency_sum, ai_tasks as f64),
        ai_cost_savings: round2(savings),
        models: models.finish(config),
        by_product: by_product.finish(config),
        by_market: by_market.finish(config),
    }
}

/// `round((base + min(100, (averageTime / 2) * 100)) / 2)`
pub fn model_efficiency(average_time: f64, config: &EngineConfig) -> f64 {
    let time_score = (average_time / 2.0 * 100.0).min(100.0);
    ((config.base_model_efficiency + time_score) / 2.0).round()
}

/// Share of a task's elapsed time assumed saved by AI, in percent.
fn task_efficiency(hours: f64, ai_hours: f64, config: &EngineConfig) -> f64 {
    if hours <= 0.0 {
        return 0.0;
    }
    (100.0 * ai_hours * config.ai_time_savings_ratio / hours).clamp(0.0, 100.0)
}

#[derive(Default)]
struct UsageGroups {
    groups: BTreeMap<String, (u64, f64)>,
}

impl UsageGroups {
    fn add(&mut self, key: &str, ai_hours: f64) {
        let entry = self.groups.entry(key.to_string()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += ai_hours;
    }

    fn finish(self, config: &EngineConfig) -> BTreeMap<String, AiUsage> {
        self.groups
            .into_iter()
            .map(|(key, (count, time))| {
                let total_time = round2(time);
                let average_time = ratio(total_time, count as f64);
                let usage = AiUsage {
                    count,
                    total_time,
                    average_time,
                    efficiency: model_efficiency(average_time, config),
                };
                (key, usage)
            })
            .collect()
    }
}
