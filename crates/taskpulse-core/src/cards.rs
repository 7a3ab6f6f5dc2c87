//! Dashboard card metrics
//!
//! The card set is closed; [`define_cards!`] generates the [`CardType`] enum
//! and its lookup table from one list. Unknown identifiers never panic or
//! error out of the facade: they come back as a zero metric with `error` set.

use crate::error::AnalyticsError;
use crate::{Analytics, EntityRollup, EntityStats, TaskTotals};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct CardDef {
    pub id: &'static str,
    pub title: &'static str,
    /// Category key read by category cards.
    pub category: Option<&'static str>,
}

macro_rules! define_cards {
    ( $( $variant:ident = $index:expr => { id: $id:expr, title: $title:expr, category: $cat:expr } ),+ $(,)? ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(usize)]
        pub enum CardType {
            $( $variant = $index ),+
        }

        impl CardType {
            pub const COUNT: usize = [ $( $index ),+ ].len();
            pub const ALL: [CardType; Self::COUNT] = [ $( CardType::$variant ),+ ];

            pub fn data(&self) -> &'static CardDef {
                &CARDS[*self as usize]
            }

            pub fn as_str(&self) -> &'static str {
                self.data().id
            }

            pub fn title(&self) -> &'static str {
                self.data().title
            }

            pub fn category(&self) -> Option<&'static str> {
                self.data().category
            }

            pub fn iter() -> impl Iterator<Item = CardType> {
                Self::ALL.iter().copied()
            }
        }

        pub const CARDS: [CardDef; CardType::COUNT] = [
            $( CardDef {
                id: $id,
                title: $title,
                category: $cat,
            } ),+
        ];

        const _: () = {
            let mut i = 0;
            $(
                assert!($index == i, "CardType indices must be sequential");
                i += 1;
            )+
            assert!(i == CardType::COUNT);
        };
    };
}

define_cards!(
    TotalTasks = 0 => {
        id: "total-tasks",
        title: "Total Tasks",
        category: None
    },
    TotalHours = 1 => {
        id: "total-hours",
        title: "Total Hours",
        category: None
    },
    AiCombined = 2 => {
        id: "ai-combined",
        title: "AI Usage",
        category: None
    },
    Development = 3 => {
        id: "development",
        title: "Development",
        category: Some("development")
    },
    Design = 4 => {
        id: "design",
        title: "Design",
        category: Some("design")
    },
    Video = 5 => {
        id: "video",
        title: "Video Editing",
        category: Some("video")
    },
    UserPerformance = 6 => {
        id: "user-performance",
        title: "Active Users",
        category: None
    },
    TopReporter = 7 => {
        id: "top-reporter",
        title: "Top Reporter",
        category: None
    },
    Markets = 8 => {
        id: "markets",
        title: "Markets",
        category: None
    },
    Products = 9 => {
        id: "products",
        title: "Products",
        category: None
    },
);

impl FromStr for CardType {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CardType::iter()
            .find(|card| card.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AnalyticsError::UnknownCard(s.to_string()))
    }
}

/// Display-ready value and context for one card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMetric {
    pub value: f64,
    pub additional_data: Value,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl CardMetric {
    pub fn new(value: f64, additional_data: Value) -> Self {
        Self {
            value,
            additional_data,
            is_loading: false,
            error: None,
        }
    }

    /// Placeholder while analytics are still being computed.
    pub fn loading() -> Self {
        Self {
            value: 0.0,
            additional_data: json!({}),
            is_loading: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            value: 0.0,
            additional_data: json!({}),
            is_loading: false,
            error: Some(message.into()),
        }
    }
}

/// Metric for the card named `card_type`; `category` overrides the key a category card reads.
pub fn get_metric_for_card(card_type: &str, analytics: &Analytics, category: Option<&str>) -> CardMetric {
    match card_type.parse::<CardType>() {
        Ok(card) => metric_for_card(card, analytics, category),
        Err(err) => {
            warn!(target: "taskpulse::cards", card_type, "unknown card type requested");
            CardMetric::failed(err.to_string())
        }
    }
}

/// Like [`get_metric_for_card`], but reports a loading card while `analytics` is not ready.
pub fn get_metric_or_loading(
    card_type: &str,
    analytics: Option<&Analytics>,
    category: Option<&str>,
) -> CardMetric {
    match analytics {
        Some(analytics) => get_metric_for_card(card_type, analytics, category),
        None => CardMetric::loading(),
    }
}

pub fn metric_for_card(card: CardType, analytics: &Analytics, category: Option<&str>) -> CardMetric {
    let summary = &analytics.summary;
    match card {
        CardType::TotalTasks => CardMetric::new(
            summary.total_tasks as f64,
            json!({
                "completedTasks": summary.completed_tasks,
                "completionRate": summary.completion_rate,
                "averageHoursPerTask": summary.average_hours_per_task,
            }),
        ),
        CardType::TotalHours => CardMetric::new(
            summary.total_hours,
            json!({
                "totalTasks": summary.total_tasks,
                "averageHoursPerTask": summary.average_hours_per_task,
                "totalTimeWithAI": summary.total_time_with_ai,
            }),
        ),
        CardType::AiCombined => {
            let ai = &analytics.ai_analytics;
            let top_model = ai
                .models
                .iter()
                .max_by(|(a_name, a), (b_name, b)| a.count.cmp(&b.count).then_with(|| b_name.cmp(a_name)))
                .map(|(name, _)| name.as_str())
                .unwrap_or_default();
            CardMetric::new(
                ai.total_ai_time,
                json!({
                    "totalAITasks": ai.total_ai_tasks,
                    "aiUsagePercentage": ai.ai_usage_percentage,
                    "averageAITimePerTask": ai.average_ai_time_per_task,
                    "aiEfficiency": ai.ai_efficiency,
                    "aiCostSavings": ai.ai_cost_savings,
                    "modelsUsed": ai.models.len(),
                    "topModel": top_model,
                }),
            )
        }
        CardType::Development | CardType::Design | CardType::Video => {
            let key = category
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .or(card.category())
                .unwrap_or_default();
            category_metric(key, analytics.categories.get(key))
        }
        CardType::UserPerformance => {
            let users = &analytics.rollups.users;
            CardMetric::new(
                users.total_entities as f64,
                json!({
                    "averageTasksPerUser": users.average_tasks_per_entity,
                    "averageHoursPerUser": users.average_hours_per_entity,
                    "topUser": users.top_entity,
                    "overallScore": analytics.performance.overall_score,
                }),
            )
        }
        CardType::TopReporter => {
            let top = &analytics.top_reporter;
            CardMetric::new(
                top.total_reporters as f64,
                json!({
                    "reporterId": top.id,
                    "reporterName": top.name,
                    "reporterEmail": top.email,
                    "totalTasks": top.total_tasks,
                    "totalHours": top.total_hours,
                    "completionRate": top.completion_rate,
                }),
            )
        }
        CardType::Markets => entity_metric(&analytics.rollups.markets, &analytics.markets),
        CardType::Products => entity_metric(&analytics.rollups.products, &analytics.products),
    }
}

/// Every known card in one call.
pub fn get_all_metrics(analytics: &Analytics) -> BTreeMap<&'static str, CardMetric> {
    CardType::iter()
        .map(|card| (card.as_str(), metric_for_card(card, analytics, None)))
        .collect()
}

fn category_metric(key: &str, totals: Option<&TaskTotals>) -> CardMetric {
    let totals = totals.cloned().unwrap_or_default();
    CardMetric::new(
        totals.total_tasks as f64,
        json!({
            "category": key,
            "totalHours": totals.total_hours,
            "averageHoursPerTask": totals.average_hours_per_task,
            "tasksWithAI": totals.tasks_with_ai,
            "aiUsagePercentage": totals.ai_usage_percentage,
            "completionRate": totals.completion_rate,
        }),
    )
}

fn entity_metric(rollup: &EntityRollup, entities: &BTreeMap<String, EntityStats>) -> CardMetric {
    let top = entities.get(&rollup.top_entity);
    CardMetric::new(
        rollup.total_entities as f64,
        json!({
            "topEntity": rollup.top_entity,
            "topEntityTasks": top.map(|e| e.total_tasks).unwrap_or(0),
            "topEntityHours": top.map(|e| e.total_hours).unwrap_or(0.0),
            "averageTasksPerEntity": rollup.average_tasks_per_entity,
            "averageHoursPerEntity": rollup.average_hours_per_entity,
        }),
    )
}
