mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use taskpulse_core::{
    entities_from_json, generate_cache_key, get_all_metrics, get_metric_for_card, tasks_from_json,
    Analytics, AnalyticsCalculator, CardMetric, CardType, EntityRef, TaskRecord,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskpulse")]
#[command(author, version, about = "Team task analytics and dashboard metrics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Enable debug logging")]
    debug: bool,

    #[arg(long, global = true, help = "Path to config.toml")]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct InputArgs {
    #[arg(long, help = "JSON file holding the task array")]
    tasks: PathBuf,

    #[arg(long, help = "JSON file holding the reporter/user reference list")]
    reporters: Option<PathBuf>,

    #[arg(long, help = "Month identifier (e.g. 2025-01)")]
    month: String,

    #[arg(long, help = "Restrict analytics to one user id")]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Compute the full analytics result")]
    Analytics {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    #[command(about = "Show dashboard card metrics")]
    Cards {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, help = "Only show this card (e.g. total-hours)")]
        card: Option<String>,
        #[arg(long, help = "Category key read by category cards")]
        category: Option<String>,
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    #[command(about = "Print the cache key for a task collection")]
    CacheKey {
        #[arg(long, help = "JSON file holding the task array")]
        tasks: PathBuf,
        #[arg(long, help = "Month identifier (e.g. 2025-01)")]
        month: String,
        #[arg(long, help = "Restrict to one user id")]
        user: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match cli.command {
        Commands::Analytics { input, json } => {
            let calculator = load_calculator(cli.config.as_deref())?;
            run_analytics(&calculator, &input, json)
        }
        Commands::Cards {
            input,
            card,
            category,
            json,
        } => {
            let calculator = load_calculator(cli.config.as_deref())?;
            run_cards(&calculator, &input, card.as_deref(), category.as_deref(), json)
        }
        Commands::CacheKey { tasks, month, user } => {
            let tasks = load_tasks(&tasks)?;
            println!("{}", generate_cache_key(&tasks, &month, user.as_deref()));
            Ok(())
        }
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_calculator(path: Option<&Path>) -> Result<AnalyticsCalculator> {
    let config = config::load_engine_config(path)?;
    Ok(AnalyticsCalculator::new(config))
}

/// Unreadable files are errors; content that is not JSON reads as `null`.
fn load_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    match serde_json::from_str(&content) {
        Ok(value) => Ok(value),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "input is not valid JSON, treating as empty");
            Ok(Value::Null)
        }
    }
}

fn load_tasks(path: &Path) -> Result<Vec<TaskRecord>> {
    Ok(tasks_from_json(&load_json(path)?))
}

fn load_references(path: Option<&Path>) -> Result<Vec<EntityRef>> {
    match path {
        Some(path) => Ok(entities_from_json(&load_json(path)?)),
        None => Ok(Vec::new()),
    }
}

fn compute(calculator: &AnalyticsCalculator, input: &InputArgs) -> Result<Analytics> {
    let tasks = load_tasks(&input.tasks)?;
    let reporters = load_references(input.reporters.as_deref())?;
    Ok(calculator.calculate_all_analytics(&tasks, &input.month, input.user.as_deref(), &reporters))
}

fn run_analytics(calculator: &AnalyticsCalculator, input: &InputArgs, json: bool) -> Result<()> {
    let analytics = compute(calculator, input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analytics)?);
        return Ok(());
    }

    use comfy_table::{ContentArrangement, Table};

    let scope = analytics.user_id.as_deref().unwrap_or("all users");
    println!(
        "\n  {} {}\n",
        format!("Analytics for {}", analytics.month_id).cyan().bold(),
        format!("({scope})").bright_black()
    );

    if analytics.is_empty() {
        println!("  {}", "No valid tasks.".bright_black());
        println!("  {}", analytics.cache_key.bright_black());
        return Ok(());
    }

    let summary = &analytics.summary;
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Category", "Tasks", "Hours", "AI Tasks", "AI %", "Completed %"]);
    for (name, totals) in &analytics.categories {
        table.add_row(vec![
            name.clone(),
            totals.total_tasks.to_string(),
            format_hours(totals.total_hours),
            totals.tasks_with_ai.to_string(),
            format_percent(totals.ai_usage_percentage),
            format_percent(totals.completion_rate),
        ]);
    }
    table.add_row(vec![
        "Total".to_string(),
        summary.total_tasks.to_string(),
        format_hours(summary.total_hours),
        summary.tasks_with_ai.to_string(),
        format_percent(summary.ai_usage_percentage),
        format_percent(summary.completion_rate),
    ]);
    println!("{table}");

    let performance = &analytics.performance;
    println!(
        "\n  {} efficiency {} | productivity {} | quality {} | overall {}",
        "Performance:".cyan(),
        format_percent(performance.efficiency),
        performance.productivity,
        format_percent(performance.quality),
        performance.overall_score
    );

    let ai = &analytics.ai_analytics;
    println!(
        "  {} {} tasks, {} | efficiency {} | savings {}",
        "AI:".cyan(),
        ai.total_ai_tasks,
        format_hours(ai.total_ai_time),
        format_percent(ai.ai_efficiency),
        format_currency(ai.ai_cost_savings)
    );

    let top = &analytics.top_reporter;
    if top.total_tasks > 0 {
        println!(
            "  {} {} ({} tasks, {}) | {} reporters",
            "Top reporter:".cyan(),
            top.name,
            top.total_tasks,
            format_hours(top.total_hours),
            top.total_reporters
        );
    }

    println!("\n  {}", analytics.cache_key.bright_black());
    Ok(())
}

fn run_cards(
    calculator: &AnalyticsCalculator,
    input: &InputArgs,
    card: Option<&str>,
    category: Option<&str>,
    json: bool,
) -> Result<()> {
    let analytics = compute(calculator, input)?;

    let metrics: Vec<(String, CardMetric)> = match card {
        Some(card) => vec![(card.to_string(), get_metric_for_card(card, &analytics, category))],
        None => get_all_metrics(&analytics)
            .into_iter()
            .map(|(id, metric)| (id.to_string(), metric))
            .collect(),
    };

    if json {
        let output: BTreeMap<String, CardMetric> = metrics.into_iter().collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    use comfy_table::{ContentArrangement, Table};

    println!(
        "\n  {}\n",
        format!("Cards for {}", analytics.month_id).cyan().bold()
    );

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Card", "Title", "Value", "Details"]);
    for (id, metric) in &metrics {
        let title = id
            .parse::<CardType>()
            .map(|card| card.title())
            .unwrap_or("-");
        let details = match &metric.error {
            Some(err) => err.clone(),
            None => metric.additional_data.to_string(),
        };
        table.add_row(vec![
            id.clone(),
            title.to_string(),
            format_value(metric.value),
            details,
        ]);
    }
    println!("{table}");

    Ok(())
}

fn format_value(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        format!("{n:.2}")
    }
}

fn format_hours(n: f64) -> String {
    format!("{}h", format_value(n))
}

fn format_percent(n: f64) -> String {
    format!("{n:.0}%")
}

fn format_currency(n: f64) -> String {
    if n >= 1000.0 {
        format!("${:.2}K", n / 1000.0)
    } else {
        format!("${:.2}", n)
    }
}
