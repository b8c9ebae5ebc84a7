use starlog_core::storage::{keys, KeyValueStore};
use starlog_core::Database;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("starlog/data.db")
    }

    fn templates_path(&self) -> PathBuf {
        self.xdg_data.join("starlog/templates.json")
    }

    fn write_config(&self, content: &str) {
        let dir = self.xdg_config.join("starlog");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), content).expect("failed to write config");
    }
}

fn run(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("starlog"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute starlog: {e}"))
}

fn render_args(args: &[&str]) -> String {
    args.iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "starlog {} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        render_args(args),
        output.status,
        stdout,
        stderr
    );
}

/// Run and require success, returning stdout
fn run_ok(env: &CliTestEnv, args: &[&str]) -> String {
    let output = run(env, args);
    assert_success(args, &output);
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Run and require failure, returning stderr
fn run_err(env: &CliTestEnv, args: &[&str]) -> String {
    let output = run(env, args);
    assert!(
        !output.status.success(),
        "starlog {} should have failed\nstdout:\n{}",
        render_args(args),
        String::from_utf8_lossy(&output.stdout)
    );
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const FULL_MARKS: &[&str] = &[
    "session",
    "end",
    "--rating",
    "focus=5",
    "--rating",
    "engagement=5",
    "--rating",
    "productivity=5",
    "--rating",
    "energy=5",
    "--rating",
    "distraction-handling=5",
    "--answer",
    "main-distraction=Phone",
];

#[test]
fn first_run_writes_database_and_default_template() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["balance"]);
    assert!(stdout.contains("Available: 0 stars"), "got:\n{stdout}");

    assert!(env.db_path().exists());
    assert!(env.templates_path().exists());

    let stdout = run_ok(&env, &["template", "list"]);
    assert!(stdout.contains("distraction-evaluation"));
    assert!(stdout.contains("7 questions"));

    // the catalog is seeded into storage on first load
    let db = Database::open(&env.db_path()).expect("failed to open db");
    db.migrate().expect("failed to migrate db");
    let rewards = db.get(keys::REWARDS).unwrap().expect("rewards mirrored");
    let rewards: serde_json::Value = serde_json::from_str(&rewards).unwrap();
    assert_eq!(rewards.as_array().map(Vec::len), Some(8));
}

#[test]
fn task_lifecycle() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["task", "add", "  Read chapter 4  ", "--goal", "notes"]);
    assert!(stdout.contains("Added task Read chapter 4"));

    let db = Database::open(&env.db_path()).expect("failed to open db");
    let raw = db.get(keys::TASKS).unwrap().expect("tasks mirrored");
    let tasks: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let task_id = tasks[0]["id"].as_str().unwrap().to_string();
    drop(db);

    run_ok(&env, &["task", "complete", &task_id, "--result", "done"]);
    let stdout = run_ok(&env, &["task", "list"]);
    assert!(stdout.contains(&format!("[x] {}", task_id)), "got:\n{stdout}");
    assert!(stdout.contains("goal: notes"));

    run_ok(&env, &["task", "reopen", &task_id]);
    let stdout = run_ok(&env, &["task", "list"]);
    assert!(stdout.contains(&format!("[ ] {}", task_id)));

    let stderr = run_err(&env, &["task", "add", "   "]);
    assert!(stderr.contains("validation error"), "got:\n{stderr}");

    run_ok(&env, &["task", "remove", &task_id]);
    let stdout = run_ok(&env, &["task", "list"]);
    assert!(stdout.contains("No tasks yet"));

    let stderr = run_err(&env, &["task", "remove", &task_id]);
    assert!(stderr.contains("task not found"));
}

#[test]
fn sessions_earn_stars_that_buy_rewards() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["session", "start", "--minutes", "25"]);
    assert!(stdout.contains("Started Session 1"), "got:\n{stdout}");
    assert!(stdout.contains("Planned length: 25m 00s"), "got:\n{stdout}");

    let stdout = run_ok(&env, &["session", "status"]);
    assert!(stdout.contains("[focus]"));

    let stdout = run_ok(&env, FULL_MARKS);
    assert!(stdout.contains("earned 25 stars"), "got:\n{stdout}");
    assert!(stdout.contains("Balance: 25 stars"));

    let stdout = run_ok(&env, &["reward", "buy", "4"]);
    assert!(stdout.contains("Bought Coffee Treat for 25 stars. Balance: 0 stars"));

    let stderr = run_err(&env, &["reward", "buy", "4"]);
    assert!(stderr.contains("on cooldown"), "got:\n{stderr}");

    let stderr = run_err(&env, &["reward", "buy", "2"]);
    assert!(stderr.contains("insufficient stars: need 50, have 0"), "got:\n{stderr}");

    let stdout = run_ok(&env, &["reward", "list", "--format", "json"]);
    let rows: serde_json::Value = serde_json::from_str(&stdout).expect("json output");
    let coffee = rows
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["reward"]["id"] == "4")
        .expect("coffee listed");
    assert_eq!(coffee["state"], "cooldown");
    assert!(coffee["cooldownRemainingSecs"].as_i64().unwrap() > 0);

    let stdout = run_ok(&env, &["reward", "history"]);
    assert!(stdout.contains("Coffee Treat"));

    let stdout = run_ok(&env, &["stats", "--format", "json"]);
    let stats: serde_json::Value = serde_json::from_str(&stdout).expect("json output");
    assert_eq!(stats["totalSessions"], 1);
    assert_eq!(stats["averageRating"], 5.0);
    assert_eq!(stats["totalAnswered"], 6);
}

#[test]
fn ending_without_active_session_fails() {
    let env = CliTestEnv::new();

    let stderr = run_err(&env, &["session", "end"]);
    assert!(stderr.contains("no active session"), "got:\n{stderr}");

    let stdout = run_ok(&env, &["stats"]);
    assert!(stdout.contains("No sessions completed yet."));

    let stdout = run_ok(&env, &["stats", "--format", "json"]);
    assert_eq!(stdout.trim(), "null");
}

#[test]
fn bad_ratings_are_rejected_and_session_stays_active() {
    let env = CliTestEnv::new();
    run_ok(&env, &["session", "start"]);

    let stderr = run_err(&env, &["session", "end", "--rating", "mood=3"]);
    assert!(stderr.contains("unknown question id 'mood'"), "got:\n{stderr}");

    for rating in ["focus=0", "focus=6", "focus=9223372036854775807"] {
        let stderr = run_err(&env, &["session", "end", "--rating", rating]);
        assert!(stderr.contains("must be between 1 and 5"), "got:\n{stderr}");
    }

    let stdout = run_ok(&env, &["session", "status"]);
    assert!(stdout.contains("Session 1"));

    run_ok(&env, &["session", "cancel"]);
    let stdout = run_ok(&env, &["session", "status"]);
    assert!(stdout.contains("No active session."));
}

#[test]
fn clearing_history_resets_purchases() {
    let env = CliTestEnv::new();
    run_ok(&env, &["session", "start"]);
    run_ok(&env, FULL_MARKS);
    run_ok(&env, &["reward", "buy", "4"]);

    run_ok(&env, &["session", "clear"]);

    let stdout = run_ok(&env, &["reward", "history"]);
    assert!(stdout.contains("No purchases yet."), "got:\n{stdout}");
    let stdout = run_ok(&env, &["balance"]);
    assert!(stdout.contains("Spent:     0 stars"));
    assert!(stdout.contains("Available: 0 stars"));
}

#[test]
fn custom_reward_cost_rules() {
    let env = CliTestEnv::new();

    let stderr = run_err(&env, &["reward", "add", "Nap"]);
    assert!(stderr.contains("validation error"), "got:\n{stderr}");

    let stderr = run_err(&env, &["reward", "add", "Nap", "--cost", "0"]);
    assert!(stderr.contains("validation error"));

    let stderr = run_err(&env, &["reward", "add", "Nap", "--cost", "9223372036854775808"]);
    assert!(stderr.contains("whole number"), "got:\n{stderr}");

    let stdout = run_ok(&env, &["reward", "add", "Nap", "--cost", "30", "--emoji", "😴"]);
    assert!(stdout.contains("Added reward Nap for 30 stars"));

    let stdout = run_ok(
        &env,
        &[
            "reward",
            "add",
            "Bonus",
            "--cost",
            "-5",
            "--description",
            "because RYAN IS COOL",
        ],
    );
    assert!(stdout.contains("for -5 stars"), "got:\n{stdout}");
}

#[test]
fn configured_override_phrase_is_used() {
    let env = CliTestEnv::new();
    env.write_config(
        r#"
[rewards]
override_phrase = "open sesame"
"#,
    );

    let stderr = run_err(
        &env,
        &["reward", "add", "Bonus", "--cost", "0", "--description", "ryan is cool"],
    );
    assert!(stderr.contains("validation error"), "got:\n{stderr}");

    run_ok(
        &env,
        &["reward", "add", "Bonus", "--cost", "0", "--description", "Open Sesame"],
    );
}

#[test]
fn template_management() {
    let env = CliTestEnv::new();
    let file = env.home.join("quick.json");
    fs::write(
        &file,
        r#"{
    "id": "quick",
    "name": "Quick check",
    "description": "",
    "questions": [
        { "id": "focus", "label": "Focus?", "type": "rating", "stars": true }
    ]
}"#,
    )
    .unwrap();

    run_ok(&env, &["template", "add", file.to_str().unwrap()]);
    let stdout = run_ok(&env, &["template", "show", "quick"]);
    assert!(stdout.contains("[focus] Focus? <rating> *"), "got:\n{stdout}");

    let stdout = run_ok(&env, &["session", "start", "--template", "quick"]);
    assert!(stdout.contains("Quick check"));
    let stdout = run_ok(&env, &["session", "end", "--rating", "focus=3"]);
    assert!(stdout.contains("earned 3 stars"));

    run_ok(&env, &["template", "delete", "distraction-evaluation"]);
    let stderr = run_err(&env, &["template", "delete", "quick"]);
    assert!(stderr.contains("cannot delete the last template"));
}

#[test]
fn tutorial_walkthrough() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["tutorial", "status"]);
    assert!(stdout.contains("Tutorial not started."));

    let stdout = run_ok(&env, &["tutorial", "start"]);
    assert!(stdout.contains("Step 1/8: Welcome to starlog!"), "got:\n{stdout}");

    let stdout = run_ok(&env, &["tutorial", "next"]);
    assert!(stdout.contains("Step 2/8"));
    assert!(stdout.contains("Completed 1 of 8 steps"));

    let stdout = run_ok(&env, &["tutorial", "skip"]);
    assert!(stdout.contains("Tutorial skipped."));

    let stdout = run_ok(&env, &["tutorial", "reset"]);
    assert!(stdout.contains("Tutorial not started."));
    assert!(stdout.contains("Completed 0 of 8 steps"));
}
