//! Analytics orchestration
//!
//! Runs every calculator over the user-filtered task set and merges the
//! slices into one [`Analytics`] value. Internal failures never escape:
//! [`AnalyticsCalculator::calculate_all_analytics`] degrades to the empty
//! result and logs the cause.

use crate::ai::calculate_ai_analytics;
use crate::base::{
    filter_tasks_by_user, generate_cache_key, get_day_key, get_empty_analytics, get_week_key,
    normalize_user_id, parse_date, percentage, round2, valid_tasks,
};
use crate::config::EngineConfig;
use crate::entities::{
    calculate_market_analytics, calculate_product_analytics, calculate_reporter_analytics,
    calculate_user_analytics,
};
use crate::error::{AnalyticsError, Result};
use crate::records::{EntityRef, TaskRecord};
use crate::summary::{
    calculate_category_analytics, calculate_performance_analytics, calculate_summary,
};
use crate::{
    AiTrendBucket, Analytics, DailyStats, EntityRollups, TopReporter, TrendBucket, Trends,
};
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, error};

#[derive(Debug, Clone, Default)]
pub struct AnalyticsCalculator {
    config: EngineConfig,
}

impl AnalyticsCalculator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Full analytics for `tasks`, filtered to `user_id` when given.
    ///
    /// Never fails: an empty or invalid collection, or any internal error,
    /// yields the zero-valued result carrying the same cache key.
    pub fn calculate_all_analytics(
        &self,
        tasks: &[TaskRecord],
        month_id: &str,
        user_id: Option<&str>,
        reporters: &[EntityRef],
    ) -> Analytics {
        let user_id = normalize_user_id(user_id);
        match self.try_calculate_all_analytics(tasks, month_id, user_id, reporters) {
            Ok(analytics) => analytics,
            Err(err) => {
                error!(
                    target: "taskpulse::analytics",
                    error = %err,
                    month_id,
                    tasks = tasks.len(),
                    "analytics calculation failed, returning empty analytics"
                );
                let mut empty = get_empty_analytics(month_id, user_id);
                empty.cache_key = generate_cache_key(tasks, month_id, user_id);
                empty
            }
        }
    }

    pub fn try_calculate_all_analytics(
        &self,
        tasks: &[TaskRecord],
        month_id: &str,
        user_id: Option<&str>,
        reporters: &[EntityRef],
    ) -> Result<Analytics> {
        let user_id = normalize_user_id(user_id);
        let cache_key = generate_cache_key(tasks, month_id, user_id);
        let filtered = filter_tasks_by_user(tasks, user_id);
        let valid = valid_tasks(&filtered).count();

        debug!(
            target: "taskpulse::analytics",
            month_id,
            user_id = user_id.unwrap_or("all"),
            total = tasks.len(),
            filtered = filtered.len(),
            valid,
            "calculating analytics"
        );

        if valid == 0 {
            let mut empty = get_empty_analytics(month_id, user_id);
            empty.cache_key = cache_key;
            return Ok(empty);
        }

        let config = &self.config;
        let reporter_report = calculate_reporter_analytics(&filtered, reporters, config);
        let product_report = calculate_product_analytics(&filtered, config);
        let market_report = calculate_market_analytics(&filtered, config);
        let user_report = calculate_user_analytics(&filtered, reporters, config);

        let top_reporter = top_reporter_from(
            reporter_report.top(),
            reporter_report.rollup.total_entities,
        );
        let rollups = EntityRollups {
            reporters: reporter_report.rollup.clone(),
            products: product_report.rollup.clone(),
            markets: market_report.rollup.clone(),
            users: user_report.rollup,
        };

        let analytics = Analytics {
            month_id: month_id.to_string(),
            user_id: user_id.map(str::to_string),
            summary: calculate_summary(&filtered),
            categories: calculate_category_analytics(&filtered, config),
            performance: calculate_performance_analytics(&filtered, config),
            markets: market_report.into_map(),
            products: product_report.into_map(),
            reporters: reporter_report.into_map(),
            rollups,
            ai_analytics: calculate_ai_analytics(&filtered, config),
            trends: self.calculate_trends(&filtered),
            daily_analytics: self.calculate_daily_analytics(&filtered),
            top_reporter,
            last_calculated: Utc::now(),
            cache_key,
        };

        ensure_finite(&analytics)?;

        debug!(
            target: "taskpulse::analytics",
            cache_key = %analytics.cache_key,
            tasks = analytics.summary.total_tasks,
            "analytics calculated"
        );
        Ok(analytics)
    }

    /// Weekly, daily, per-category weekly and AI weekly buckets.
    /// Tasks without a parsable `createdAt` are left out.
    pub fn calculate_trends(&self, tasks: &[TaskRecord]) -> Trends {
        let mut trends = Trends::default();

        for task in valid_tasks(tasks) {
            let Some(date) = task.created_at.as_ref().and_then(parse_date) else {
                continue;
            };
            let week = get_week_key(&date);
            let day = get_day_key(&date);
            let ai_hours = task.ai_hours();

            add_to_bucket(trends.weekly.entry(week.clone()).or_default(), task);
            add_to_bucket(trends.daily.entry(day).or_default(), task);
            add_to_bucket(
                trends
                    .category_trends
                    .entry(task.category_or(&self.config.default_category).to_string())
                    .or_default()
                    .entry(week.clone())
                    .or_default(),
                task,
            );

            let ai_bucket = trends.ai_trends.entry(week).or_default();
            ai_bucket.total_tasks += 1;
            if ai_hours > 0.0 {
                ai_bucket.ai_tasks += 1;
                ai_bucket.ai_time += ai_hours;
            }
        }

        trends.weekly.values_mut().for_each(round_bucket);
        trends.daily.values_mut().for_each(round_bucket);
        trends
            .category_trends
            .values_mut()
            .flat_map(|weeks| weeks.values_mut())
            .for_each(round_bucket);
        trends.ai_trends.values_mut().for_each(finish_ai_bucket);

        trends
    }

    /// Per-calendar-day counters with a category breakdown.
    pub fn calculate_daily_analytics(&self, tasks: &[TaskRecord]) -> BTreeMap<String, DailyStats> {
        let mut days: BTreeMap<String, DailyStats> = BTreeMap::new();

        for task in valid_tasks(tasks) {
            let Some(date) = task.created_at.as_ref().and_then(parse_date) else {
                continue;
            };
            let day = days.entry(get_day_key(&date)).or_default();
            day.count += 1;
            day.hours += task.hours();
            day.ai_time += task.ai_hours();
            if task.is_completed() {
                day.completed_tasks += 1;
            }
            *day
                .categories
                .entry(task.category_or(&self.config.default_category).to_string())
                .or_insert(0) += 1;
        }

        for day in days.values_mut() {
            day.hours = round2(day.hours);
            day.ai_time = round2(day.ai_time);
        }
        days
    }

    /// The reporter with the most tasks, named from `reporters` when possible.
    pub fn calculate_top_reporter_analytics(
        &self,
        tasks: &[TaskRecord],
        reporters: &[EntityRef],
    ) -> TopReporter {
        let report = calculate_reporter_analytics(tasks, reporters, &self.config);
        top_reporter_from(report.top(), report.rollup.total_entities)
    }
}

fn top_reporter_from(top: Option<&crate::EntityStats>, total_reporters: u64) -> TopReporter {
    match top {
        Some(stats) => TopReporter {
            id: stats.id.clone(),
            name: stats.name.clone(),
            email: stats.email.clone(),
            total_tasks: stats.total_tasks,
            total_hours: stats.total_hours,
            completed_tasks: stats.completed_tasks,
            completion_rate: stats.completion_rate,
            total_reporters,
        },
        None => TopReporter::default(),
    }
}

fn add_to_bucket(bucket: &mut TrendBucket, task: &TaskRecord) {
    bucket.count += 1;
    bucket.hours += task.hours();
    bucket.ai_time += task.ai_hours();
}

fn round_bucket(bucket: &mut TrendBucket) {
    bucket.hours = round2(bucket.hours);
    bucket.ai_time = round2(bucket.ai_time);
}

fn finish_ai_bucket(bucket: &mut AiTrendBucket) {
    bucket.ai_time = round2(bucket.ai_time);
    bucket.ai_usage_percentage = percentage(bucket.ai_tasks, bucket.total_tasks);
}

/// Sums of huge but finite inputs can overflow to infinity.
fn ensure_finite(analytics: &Analytics) -> Result<()> {
    let checks = [
        ("summary.totalHours", analytics.summary.total_hours),
        ("summary.totalTimeWithAI", analytics.summary.total_time_with_ai),
        ("summary.averageHoursPerTask", analytics.summary.average_hours_per_task),
        ("performance.overallScore", analytics.performance.overall_score),
        ("aiAnalytics.aiEfficiency", analytics.ai_analytics.ai_efficiency),
        ("aiAnalytics.aiCostSavings", analytics.ai_analytics.ai_cost_savings),
        ("rollups.reporters.totalHours", analytics.rollups.reporters.total_hours),
    ];

    match checks.iter().find(|(_, value)| !value.is_finite()) {
        Some((field, _)) => Err(AnalyticsError::NonFinite { field: *field }),
        None => Ok(()),
    }
}
