//! Whole-set totals, per-category breakdown and the composite performance score.

use crate::base::{percentage, ratio, round2, valid_tasks};
use crate::config::EngineConfig;
use crate::records::TaskRecord;
use crate::{PerformanceAnalytics, TaskTotals};
use std::collections::BTreeMap;

/// Running sums over validated tasks; rounded once in [`TotalsAccumulator::finish`].
#[derive(Debug, Clone, Default)]
pub(crate) struct TotalsAccumulator {
    tasks: u64,
    hours: f64,
    ai_time: f64,
    ai_tasks: u64,
    completed: u64,
}

impl TotalsAccumulator {
    pub(crate) fn add(&mut self, task: &TaskRecord) {
        self.tasks += 1;
        self.hours += task.hours();
        let ai_hours = task.ai_hours();
        if ai_hours > 0.0 {
            self.ai_tasks += 1;
            self.ai_time += ai_hours;
        }
        if task.is_completed() {
            self.completed += 1;
        }
    }

    pub(crate) fn finish(&self) -> TaskTotals {
        let total_hours = round2(self.hours);
        TaskTotals {
            total_tasks: self.tasks,
            total_hours,
            total_time_with_ai: round2(self.ai_time),
            average_hours_per_task: ratio(total_hours, self.tasks as f64),
            tasks_with_ai: self.ai_tasks,
            ai_usage_percentage: percentage(self.ai_tasks, self.tasks),
            completed_tasks: self.completed,
            completion_rate: percentage(self.completed, self.tasks),
        }
    }
}

pub fn calculate_summary(tasks: &[TaskRecord]) -> TaskTotals {
    let mut acc = TotalsAccumulator::default();
    for task in valid_tasks(tasks) {
        acc.add(task);
    }
    acc.finish()
}

/// Same shape as [`calculate_summary`], grouped by category.
pub fn calculate_category_analytics(
    tasks: &[TaskRecord],
    config: &EngineConfig,
) -> BTreeMap<String, TaskTotals> {
    let mut groups: BTreeMap<String, TotalsAccumulator> = BTreeMap::new();
    for task in valid_tasks(tasks) {
        groups
            .entry(task.category_or(&config.default_category).to_string())
            .or_default()
            .add(task);
    }

    groups
        .into_iter()
        .map(|(category, acc)| (category, acc.finish()))
        .collect()
}

/// `overallScore = clamp(round(efficiency*w1 + (productivity/scale)*w2 + quality*w3), 0, 100)`
pub fn calculate_performance_analytics(
    tasks: &[TaskRecord],
    config: &EngineConfig,
) -> PerformanceAnalytics {
    let mut total = 0u64;
    let mut completed = 0u64;
    let mut without_issues = 0u64;
    let mut hours = 0.0;

    for task in valid_tasks(tasks) {
        total += 1;
        hours += task.hours();
        if task.is_completed() {
            completed += 1;
        }
        if !task.has_issues {
            without_issues += 1;
        }
    }

    if total == 0 {
        return PerformanceAnalytics::default();
    }

    let efficiency = 100.0 * completed as f64 / total as f64;
    let quality = 100.0 * without_issues as f64 / total as f64;

    let productivity_term = if config.productivity_scale == 0.0 {
        0.0
    } else {
        hours / config.productivity_scale
    };
    let score = efficiency * config.efficiency_weight
        + productivity_term * config.productivity_weight
        + quality * config.quality_weight;

    PerformanceAnalytics {
        efficiency: round2(efficiency),
        productivity: round2(hours),
        quality: round2(quality),
        overall_score: score.round().clamp(0.0, 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_task(category: Option<&str>, hours: f64, ai: f64, status: &str) -> TaskRecord {
        TaskRecord {
            category: category.map(str::to_string),
            time_in_hours: Some(hours),
            time_spent_on_ai: Some(ai),
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    fn design_pair() -> Vec<TaskRecord> {
        vec![
            mock_task(Some("design"), 2.0, 1.0, "completed"),
            mock_task(Some("design"), 3.0, 0.0, "pending"),
        ]
    }

    #[test]
    fn test_calculate_summary_empty() {
        let summary = calculate_summary(&[]);
        assert_eq!(summary, TaskTotals::default());
    }

    #[test]
    fn test_calculate_summary_design_pair() {
        let summary = calculate_summary(&design_pair());

        assert_eq!(summary.total_tasks, 2);
        assert_eq!(summary.total_hours, 5.0);
        assert_eq!(summary.total_time_with_ai, 1.0);
        assert_eq!(summary.average_hours_per_task, 2.5);
        assert_eq!(summary.tasks_with_ai, 1);
        assert_eq!(summary.ai_usage_percentage, 50.0);
        assert_eq!(summary.completed_tasks, 1);
        assert_eq!(summary.completion_rate, 50.0);
    }

    #[test]
    fn test_calculate_summary_skips_invalid_tasks() {
        let mut tasks = design_pair();
        tasks.push(TaskRecord::default());
        tasks.push(TaskRecord {
            time_in_hours: Some(-2.0),
            ..Default::default()
        });

        let summary = calculate_summary(&tasks);
        assert_eq!(summary.total_tasks, 2);
        assert_eq!(summary.total_hours, 5.0);
    }

    #[test]
    fn test_calculate_summary_rounds_hours() {
        let tasks = vec![
            mock_task(None, 0.333, 0.0, "pending"),
            mock_task(None, 0.333, 0.0, "pending"),
            mock_task(None, 0.333, 0.0, "pending"),
        ];
        let summary = calculate_summary(&tasks);

        assert_eq!(summary.total_hours, 1.0);
        assert_eq!(summary.average_hours_per_task, 0.33);
        assert_eq!(summary.ai_usage_percentage, 0.0);
    }

    #[test]
    fn test_category_analytics_partitions_tasks() {
        let tasks = vec![
            mock_task(Some("design"), 1.0, 0.0, "completed"),
            mock_task(Some("development"), 2.0, 1.0, "completed"),
            mock_task(Some("development"), 4.0, 0.0, "pending"),
            mock_task(None, 1.0, 0.0, "pending"),
            mock_task(Some(""), 1.0, 0.0, "pending"),
        ];
        let config = EngineConfig::default();
        let categories = calculate_category_analytics(&tasks, &config);

        assert_eq!(categories.len(), 3);
        assert_eq!(categories["development"].total_tasks, 2);
        assert_eq!(categories["development"].total_hours, 6.0);
        assert_eq!(categories["development"].ai_usage_percentage, 50.0);
        assert_eq!(categories["uncategorized"].total_tasks, 2);

        let grouped: u64 = categories.values().map(|c| c.total_tasks).sum();
        assert_eq!(grouped, calculate_summary(&tasks).total_tasks);
    }

    #[test]
    fn test_performance_design_pair() {
        let performance = calculate_performance_analytics(&design_pair(), &EngineConfig::default());

        assert_eq!(performance.efficiency, 50.0);
        assert_eq!(performance.productivity, 5.0);
        assert_eq!(performance.quality, 100.0);
        // 50*0.4 + (5/10)*0.3 + 100*0.3 = 50.15
        assert_eq!(performance.overall_score, 50.0);
    }

    #[test]
    fn test_performance_counts_flagged_issues() {
        let mut tasks = design_pair();
        tasks[1].has_issues = true;
        let performance = calculate_performance_analytics(&tasks, &EngineConfig::default());

        assert_eq!(performance.quality, 50.0);
        // 20 + 0.15 + 15 = 35.15
        assert_eq!(performance.overall_score, 35.0);
    }

    #[test]
    fn test_performance_score_is_clamped() {
        let tasks: Vec<TaskRecord> = (0..10)
            .map(|_| mock_task(Some("video"), 500.0, 0.0, "completed"))
            .collect();
        let performance = calculate_performance_analytics(&tasks, &EngineConfig::default());

        assert_eq!(performance.productivity, 5000.0);
        assert_eq!(performance.overall_score, 100.0);
    }

    #[test]
    fn test_performance_score_uses_unrounded_terms() {
        let tasks = vec![
            mock_task(None, 1.0, 0.0, "completed"),
            mock_task(None, 2.0, 0.0, "pending"),
            mock_task(None, 2.56, 0.0, "pending"),
        ];
        let performance = calculate_performance_analytics(&tasks, &EngineConfig::default());

        assert_eq!(performance.efficiency, 33.33);
        assert_eq!(performance.productivity, 5.56);
        assert_eq!(performance.quality, 100.0);
        // 33.333.. * 0.4 + 0.556 * 0.3 + 100 * 0.3 = 43.5001..
        assert_eq!(performance.overall_score, 44.0);
    }

    #[test]
    fn test_performance_empty() {
        let performance = calculate_performance_analytics(&[], &EngineConfig::default());
        assert_eq!(performance, PerformanceAnalytics::default());
    }
}
