use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ── Fixture helpers ────────────────────────────────────────────────────────

/// Two design tasks, one AI-assisted and completed, plus a video task
/// reported by a second reporter.
///
/// Layout:
///   <tmp>/tasks.json
///   <tmp>/reporters.json
fn create_fixture_dir() -> TempDir {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let base = tmp.path();

    let tasks = r#"[
        {
            "id": "t1",
            "category": "design",
            "timeInHours": 2,
            "timeSpentOnAI": 1,
            "aiModels": ["gpt-4"],
            "status": "completed",
            "reporterUID": "r1",
            "userUID": "u1",
            "market": "ro",
            "createdAt": "2025-01-13T09:00:00Z"
        },
        {
            "id": "t2",
            "category": "design",
            "timeInHours": "3",
            "timeSpentOnAI": 0,
            "status": "pending",
            "reporterUID": "r1",
            "userUID": "u2",
            "createdAt": { "seconds": 1736812800, "nanoseconds": 0 }
        },
        {
            "id": "t3",
            "category": "video",
            "timeInHours": 1,
            "status": "pending",
            "reporterUID": "r2",
            "userUID": "u1",
            "createdAt": "2025-01-20"
        }
    ]"#;
    fs::write(base.join("tasks.json"), tasks).unwrap();

    let reporters = r#"[
        { "id": "r1", "name": "Ana", "email": "ana@example.com" },
        { "uid": "u1", "displayName": "Dana" }
    ]"#;
    fs::write(base.join("reporters.json"), reporters).unwrap();

    tmp
}

fn cmd_with_home(tmp: &Path) -> Command {
    let mut cmd = Command::cargo_bin("taskpulse").unwrap();
    cmd.env("HOME", tmp).env_remove("RUST_LOG");
    cmd
}

fn tasks_path(tmp: &TempDir) -> PathBuf {
    tmp.path().join("tasks.json")
}

fn run_json(tmp: &TempDir, args: &[&str]) -> Value {
    let output = cmd_with_home(tmp.path())
        .args(args)
        .output()
        .expect("failed to run taskpulse");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

// ── Help ───────────────────────────────────────────────────────────────────

#[test]
fn test_help_command() {
    let mut cmd = Command::cargo_bin("taskpulse").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Team task analytics"));
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("taskpulse").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("taskpulse"));
}

#[test]
fn test_subcommand_help() {
    for (sub, about) in [
        ("analytics", "Compute the full analytics result"),
        ("cards", "Show dashboard card metrics"),
        ("cache-key", "Print the cache key"),
    ] {
        let mut cmd = Command::cargo_bin("taskpulse").unwrap();
        cmd.arg(sub)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(about));
    }
}

// ── analytics ──────────────────────────────────────────────────────────────

#[test]
fn test_analytics_json() {
    let tmp = create_fixture_dir();
    let tasks = tasks_path(&tmp);
    let reporters = tmp.path().join("reporters.json");
    let json = run_json(
        &tmp,
        &[
            "analytics",
            "--tasks",
            tasks.to_str().unwrap(),
            "--reporters",
            reporters.to_str().unwrap(),
            "--month",
            "2025-01",
            "--json",
        ],
    );

    assert_eq!(json["monthId"], "2025-01");
    assert_eq!(json["summary"]["totalTasks"], 3);
    assert_eq!(json["summary"]["totalHours"], 6.0);
    assert_eq!(json["summary"]["tasksWithAI"], 1);
    assert_eq!(json["categories"]["design"]["totalTasks"], 2);
    assert_eq!(json["categories"]["video"]["totalHours"], 1.0);
    assert_eq!(json["topReporter"]["id"], "r1");
    assert_eq!(json["topReporter"]["name"], "Ana");
    assert_eq!(json["topReporter"]["totalReporters"], 2);
    assert_eq!(json["reporters"]["r2"]["name"], "Unknown Reporter");
    assert_eq!(json["markets"]["unknown"]["totalTasks"], 2);
    assert_eq!(json["aiAnalytics"]["models"]["gpt-4"]["count"], 1);
    assert_eq!(json["trends"]["weekly"]["2025-W03"]["count"], 2);
    assert_eq!(json["trends"]["weekly"]["2025-W04"]["count"], 1);
    assert!(json["cacheKey"].as_str().unwrap().starts_with("analytics:2025-01:all:"));
}

#[test]
fn test_analytics_user_filter() {
    let tmp = create_fixture_dir();
    let tasks = tasks_path(&tmp);
    let json = run_json(
        &tmp,
        &[
            "analytics",
            "--tasks",
            tasks.to_str().unwrap(),
            "--month",
            "2025-01",
            "--user",
            "u1",
            "--json",
        ],
    );

    assert_eq!(json["userId"], "u1");
    assert_eq!(json["summary"]["totalTasks"], 2);
    assert_eq!(json["summary"]["totalHours"], 3.0);
}

#[test]
fn test_analytics_table_output() {
    let tmp = create_fixture_dir();
    let tasks = tasks_path(&tmp);
    cmd_with_home(tmp.path())
        .args(["analytics", "--tasks", tasks.to_str().unwrap(), "--month", "2025-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Analytics for 2025-01"))
        .stdout(predicate::str::contains("design"))
        .stdout(predicate::str::contains("Total"))
        .stdout(predicate::str::contains("(2 tasks, 5h) | 2 reporters"));
}

#[test]
fn test_unparsable_tasks_yield_empty_analytics() {
    let tmp = TempDir::new().unwrap();
    let tasks = tmp.path().join("tasks.json");
    fs::write(&tasks, "not json at all").unwrap();

    let json = run_json(
        &tmp,
        &["analytics", "--tasks", tasks.to_str().unwrap(), "--month", "2025-01", "--json"],
    );
    assert_eq!(json["summary"]["totalTasks"], 0);
    assert_eq!(json["summary"]["totalHours"], 0.0);
    assert!(json["categories"].as_object().unwrap().is_empty());
}

#[test]
fn test_missing_tasks_file_fails() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.json");
    cmd_with_home(tmp.path())
        .args(["analytics", "--tasks", missing.to_str().unwrap(), "--month", "2025-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

// ── config ─────────────────────────────────────────────────────────────────

#[test]
fn test_explicit_config_overrides_hourly_rate() {
    let tmp = create_fixture_dir();
    let tasks = tasks_path(&tmp);
    let config = tmp.path().join("custom.toml");
    fs::write(&config, "hourly_rate = 100.0\n").unwrap();

    let defaults = run_json(
        &tmp,
        &["analytics", "--tasks", tasks.to_str().unwrap(), "--month", "2025-01", "--json"],
    );
    // 1h of AI time * 0.3 * 50
    assert_eq!(defaults["aiAnalytics"]["aiCostSavings"], 15.0);

    let custom = run_json(
        &tmp,
        &[
            "--config",
            config.to_str().unwrap(),
            "analytics",
            "--tasks",
            tasks.to_str().unwrap(),
            "--month",
            "2025-01",
            "--json",
        ],
    );
    assert_eq!(custom["aiAnalytics"]["aiCostSavings"], 30.0);
}

#[test]
fn test_home_config_is_picked_up() {
    let tmp = create_fixture_dir();
    let config_dir = tmp.path().join(".config/taskpulse");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "default_category = \"misc\"\n").unwrap();

    let tasks = tmp.path().join("bare.json");
    fs::write(&tasks, r#"[{ "timeInHours": 1 }]"#).unwrap();

    let json = run_json(
        &tmp,
        &["analytics", "--tasks", tasks.to_str().unwrap(), "--month", "2025-01", "--json"],
    );
    assert_eq!(json["categories"]["misc"]["totalTasks"], 1);
}

#[test]
fn test_invalid_config_fails() {
    let tmp = create_fixture_dir();
    let tasks = tasks_path(&tmp);
    let config = tmp.path().join("broken.toml");
    fs::write(&config, "hourly_rate = \"lots\"\n").unwrap();

    cmd_with_home(tmp.path())
        .args(["--config", config.to_str().unwrap()])
        .args(["analytics", "--tasks", tasks.to_str().unwrap(), "--month", "2025-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

// ── cards ──────────────────────────────────────────────────────────────────

#[test]
fn test_cards_json_lists_every_card() {
    let tmp = create_fixture_dir();
    let tasks = tasks_path(&tmp);
    let json = run_json(
        &tmp,
        &["cards", "--tasks", tasks.to_str().unwrap(), "--month", "2025-01", "--json"],
    );

    let cards = json.as_object().unwrap();
    assert_eq!(cards.len(), 10);
    assert_eq!(json["total-tasks"]["value"], 3.0);
    assert_eq!(json["total-hours"]["value"], 6.0);
    assert_eq!(json["design"]["value"], 2.0);
    assert_eq!(json["top-reporter"]["additionalData"]["reporterId"], "r1");
    assert_eq!(json["ai-combined"]["additionalData"]["topModel"], "gpt-4");
    assert_eq!(json["markets"]["isLoading"], false);
}

#[test]
fn test_single_card_with_category_override() {
    let tmp = create_fixture_dir();
    let tasks = tasks_path(&tmp);
    let json = run_json(
        &tmp,
        &[
            "cards",
            "--tasks",
            tasks.to_str().unwrap(),
            "--month",
            "2025-01",
            "--card",
            "development",
            "--category",
            "video",
            "--json",
        ],
    );

    assert_eq!(json.as_object().unwrap().len(), 1);
    assert_eq!(json["development"]["value"], 1.0);
    assert_eq!(json["development"]["additionalData"]["category"], "video");
}

#[test]
fn test_unknown_card_degrades() {
    let tmp = create_fixture_dir();
    let tasks = tasks_path(&tmp);
    let json = run_json(
        &tmp,
        &[
            "cards",
            "--tasks",
            tasks.to_str().unwrap(),
            "--month",
            "2025-01",
            "--card",
            "bogus",
            "--json",
        ],
    );

    assert_eq!(json["bogus"]["value"], 0.0);
    assert!(json["bogus"]["error"].as_str().unwrap().contains("bogus"));
}

#[test]
fn test_cards_table_output() {
    let tmp = create_fixture_dir();
    let tasks = tasks_path(&tmp);
    cmd_with_home(tmp.path())
        .args(["cards", "--tasks", tasks.to_str().unwrap(), "--month", "2025-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("total-hours"))
        .stdout(predicate::str::contains("Top Reporter"));
}

// ── cache-key ──────────────────────────────────────────────────────────────

fn cache_key(tmp: &TempDir, tasks: &Path, user: Option<&str>) -> String {
    let mut cmd = cmd_with_home(tmp.path());
    cmd.args(["cache-key", "--tasks", tasks.to_str().unwrap(), "--month", "2025-01"]);
    if let Some(user) = user {
        cmd.args(["--user", user]);
    }
    let output = cmd.output().expect("failed to run taskpulse");
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

#[test]
fn test_cache_key_is_deterministic() {
    let tmp = create_fixture_dir();
    let tasks = tasks_path(&tmp);

    let first = cache_key(&tmp, &tasks, None);
    let second = cache_key(&tmp, &tasks, None);
    assert_eq!(first, second);
    assert!(first.starts_with("analytics:2025-01:all:"));

    let scoped = cache_key(&tmp, &tasks, Some("u1"));
    assert!(scoped.starts_with("analytics:2025-01:u1:"));
    assert_ne!(first, scoped);
}

#[test]
fn test_cache_key_changes_with_tasks() {
    let tmp = create_fixture_dir();
    let tasks = tasks_path(&tmp);
    let before = cache_key(&tmp, &tasks, None);

    fs::write(&tasks, r#"[{ "id": "t1", "timeInHours": 2 }]"#).unwrap();
    let after = cache_key(&tmp, &tasks, None);
    assert_ne!(before, after);
}
