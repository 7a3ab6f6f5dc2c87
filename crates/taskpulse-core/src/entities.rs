//! Group-by-entity aggregation
//!
//! One aggregator, instantiated per entity kind. Tasks are grouped by the
//! kind's key, ranked by task count and rolled up fleet-wide. Reporter and
//! user ids get a best-effort name join against the reference list; a miss
//! falls back to a placeholder label and never fails the aggregation.

use crate::base::{percentage, ratio, round2, valid_tasks};
use crate::config::EngineConfig;
use crate::records::{find_entity, EntityRef, TaskRecord};
use crate::{EntityRollup, EntityStats};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Reporter,
    Product,
    Market,
    User,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Reporter => "reporter",
            EntityKind::Product => "product",
            EntityKind::Market => "market",
            EntityKind::User => "user",
        }
    }

    /// Grouping key of `task`. Products and markets fall back to the unknown
    /// label so grouping partitions every valid task; reporters and users
    /// without an id are not attributed.
    pub fn key_of<'a>(&self, task: &'a TaskRecord, config: &'a EngineConfig) -> Option<&'a str> {
        match self {
            EntityKind::Reporter => task.reporter_key(),
            EntityKind::User => task.user_key(),
            EntityKind::Product => Some(task.product_or(&config.unknown_entity)),
            EntityKind::Market => Some(task.market_or(&config.unknown_entity)),
        }
    }

    fn joins_labels(&self) -> bool {
        matches!(self, EntityKind::Reporter | EntityKind::User)
    }

    fn placeholder<'a>(&self, config: &'a EngineConfig) -> &'a str {
        match self {
            EntityKind::User => &config.unknown_user,
            _ => &config.unknown_reporter,
        }
    }
}

/// Ranked per-entity stats plus the fleet rollup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityReport {
    pub entities: Vec<EntityStats>,
    pub rollup: EntityRollup,
}

impl EntityReport {
    pub fn top(&self) -> Option<&EntityStats> {
        self.entities.first()
    }

    pub fn into_map(self) -> BTreeMap<String, EntityStats> {
        self.entities
            .into_iter()
            .map(|stats| (stats.id.clone(), stats))
            .collect()
    }
}

pub fn aggregate_entities(
    tasks: &[TaskRecord],
    kind: EntityKind,
    references: &[EntityRef],
    config: &EngineConfig,
) -> EntityReport {
    let mut groups: HashMap<&str, EntityAccumulator> = HashMap::new();

    for task in valid_tasks(tasks) {
        let Some(key) = kind.key_of(task, config) else {
            continue;
        };
        groups.entry(key).or_default().add(task);
    }

    let mut entities: Vec<EntityStats> = groups
        .into_iter()
        .map(|(key, acc)| {
            let (name, email) = resolve_label(kind, key, references, config);
            acc.into_stats(key.to_string(), name, email)
        })
        .collect();
    entities.sort_by(rank_entities);

    let rollup = rollup(&entities);
    EntityReport { entities, rollup }
}

pub fn calculate_reporter_analytics(
    tasks: &[TaskRecord],
    reporters: &[EntityRef],
    config: &EngineConfig,
) -> EntityReport {
    aggregate_entities(tasks, EntityKind::Reporter, reporters, config)
}

pub fn calculate_product_analytics(tasks: &[TaskRecord], config: &EngineConfig) -> EntityReport {
    aggregate_entities(tasks, EntityKind::Product, &[], config)
}

pub fn calculate_market_analytics(tasks: &[TaskRecord], config: &EngineConfig) -> EntityReport {
    aggregate_entities(tasks, EntityKind::Market, &[], config)
}

pub fn calculate_user_analytics(
    tasks: &[TaskRecord],
    users: &[EntityRef],
    config: &EngineConfig,
) -> EntityReport {
    aggregate_entities(tasks, EntityKind::User, users, config)
}

fn resolve_label(
    kind: EntityKind,
    key: &str,
    references: &[EntityRef],
    config: &EngineConfig,
) -> (String, String) {
    if !kind.joins_labels() {
        return (key.to_string(), String::new());
    }

    let reference = find_entity(references, key);
    let name = reference
        .and_then(EntityRef::label)
        .unwrap_or_else(|| kind.placeholder(config));
    let email = reference.and_then(EntityRef::email).unwrap_or_default();
    (name.to_string(), email.to_string())
}

/// Task count desc, then hours desc, then id asc.
fn rank_entities(a: &EntityStats, b: &EntityStats) -> Ordering {
    b.total_tasks
        .cmp(&a.total_tasks)
        .then_with(|| {
            b.total_hours
                .partial_cmp(&a.total_hours)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.id.cmp(&b.id))
}

fn rollup(entities: &[EntityStats]) -> EntityRollup {
    let total_entities = entities.len() as u64;
    let total_tasks: u64 = entities.iter().map(|e| e.total_tasks).sum();
    let total_hours = round2(entities.iter().map(|e| e.total_hours).sum());

    EntityRollup {
        total_entities,
        total_tasks,
        total_hours,
        average_tasks_per_entity: ratio(total_tasks as f64, total_entities as f64),
        average_hours_per_entity: ratio(total_hours, total_entities as f64),
        top_entity: entities.first().map(|e| e.id.clone()).unwrap_or_default(),
    }
}

#[derive(Default)]
struct EntityAccumulator {
    tasks: u64,
    hours: f64,
    completed: u64,
    users: BTreeSet<String>,
    reporters: BTreeSet<String>,
}

impl EntityAccumulator {
    fn add(&mut self, task: &TaskRecord) {
        self.tasks += 1;
        self.hours += task.hours();
        if task.is_completed() {
            self.completed += 1;
        }
        if let Some(user) = task.user_key() {
            self.users.insert(user.to_string());
        }
        if let Some(reporter) = task.reporter_key() {
            self.reporters.insert(reporter.to_string());
        }
    }

    fn into_stats(self, id: String, name: String, email: String) -> EntityStats {
        let total_hours = round2(self.hours);
        EntityStats {
            id,
            name,
            email,
            total_tasks: self.tasks,
            total_hours,
            completed_tasks: self.completed,
            pending_tasks: self.tasks - self.completed,
            average_hours: ratio(total_hours, self.tasks as f64),
            completion_rate: percentage(self.completed, self.tasks),
            unique_users: self.users.into_iter().collect(),
            unique_reporters: self.reporters.into_iter().collect(),
        }
    }
}
