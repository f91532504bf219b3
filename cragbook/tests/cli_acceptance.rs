use cragbook_core::{AscentType, ClimbInput, Discipline, GradeRegistry, LocalStore, SessionState};
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Nothing listens on the discard port, so every backend call fails fast.
const UNREACHABLE_BACKEND: &str = "http://127.0.0.1:9";

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

    fn draft_path(&self) -> PathBuf {
        self.xdg_data.join("cragbook/active_session.json")
    }

    fn store(&self) -> LocalStore {
        LocalStore::new(
            self.draft_path(),
            self.xdg_state.join("cragbook/profile.json"),
        )
    }

    /// Leave an open session on disk, as an earlier `start` would have.
    fn seed_session(&self, climbs: &[(&str, AscentType)]) {
        let registry = GradeRegistry::builtin();
        let mut session = SessionState::start("Mark", Discipline::Bouldering, "Stonegoat")
            .expect("valid session");
        for (grade, ascent) in climbs {
            session
                .log_climb(&registry, ClimbInput::new(*grade, *ascent))
                .expect("valid climb");
        }
        self.store().save_draft(&session).expect("failed to seed draft");
    }

    fn write_config(&self, content: &str) {
        let dir = self.xdg_config.join("cragbook");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), content).expect("failed to write config");
    }
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("cragbook"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env("CRAGBOOK_API_URL", UNREACHABLE_BACKEND)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute cragbook: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "cragbook {} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        output.status,
        stdout,
        stderr
    );
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn grades_lists_builtin_scales() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["grades"]);
    assert_success(&["grades"], &output);

    let stdout = stdout_of(&output);
    assert!(stdout.contains("Stonegoat (Bouldering): Red, Red/Orange, Orange"));
    assert!(stdout.contains("Brooklyn Boulders (Bouldering): V0, V1"));
    assert!(stdout.contains("French (Sport Climbing): 5a, 5b"));
}

#[test]
fn grades_for_one_gym_is_case_insensitive() {
    let env = CliTestEnv::new();
    let args = ["grades", "--discipline", "bouldering", "--gym", "newstone"];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);
    assert_eq!(
        stdout_of(&output).trim(),
        "Newstone (Bouldering): 1, 2, 3, 4, 5, 6, 7, 8"
    );
}

#[test]
fn grades_for_unknown_gym_fails() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["grades", "--discipline", "bouldering", "--gym", "Nowhere"]);
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("Nowhere"));
}

#[test]
fn configured_scale_is_listed() {
    let env = CliTestEnv::new();
    env.write_config(
        r#"
[[grades.scales]]
discipline = "Bouldering"
gym = "Crux Barn"
grades = ["Easy", "Medium", "Hard"]
"#,
    );

    let args = ["grades", "--discipline", "bouldering", "--gym", "Crux Barn"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);
    assert!(stdout_of(&output).contains("Easy, Medium, Hard"));
}

#[test]
fn show_and_log_without_session_fail() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["show"]);
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("no open session"));

    let output = run_bin(&env, &["log", "V3"]);
    assert!(!output.status.success());
    assert!(!env.draft_path().exists());
}

#[test]
fn start_fails_when_backend_is_unreachable() {
    let env = CliTestEnv::new();
    let args = ["start", "--user", "Mark", "--gym", "Stonegoat"];

    let output = run_bin(&env, &args);
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("could not start session"));
    assert!(!env.draft_path().exists());
    assert_eq!(env.store().load_user_name(), None);
}

#[test]
fn log_delete_and_show_update_the_draft() {
    let env = CliTestEnv::new();
    env.seed_session(&[]);

    let args = ["log", "Orange", "--ascent", "flash", "--notes", "crimpy"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);
    assert!(stdout_of(&output).contains("#1  Orange / Flash"));

    let args = ["log", "Red"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let output = run_bin(&env, &["log", "V5"]);
    assert!(!output.status.success(), "V5 is not a Stonegoat grade");

    let draft = env.store().load_draft().unwrap().expect("draft kept");
    let grades: Vec<_> = draft.climbs().iter().map(|c| c.grade.as_str()).collect();
    assert_eq!(grades, vec!["Red", "Orange"]);

    let output = run_bin(&env, &["show"]);
    assert_success(&["show"], &output);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Stonegoat - Bouldering (Mark)"));
    assert!(stdout.contains("Climbs: 2  Sends: 1  Flashes: 1  Attempts: 0  Hardest: Orange"));
    assert!(stdout.contains("\"crimpy\""));

    let output = run_bin(&env, &["delete", "#1"]);
    assert_success(&["delete", "#1"], &output);
    assert!(stdout_of(&output).contains("Removed climb #1 (Orange)"));

    let output = run_bin(&env, &["delete", "1"]);
    assert_success(&["delete", "1"], &output);
    assert!(stdout_of(&output).contains("No climb #1"));

    let draft = env.store().load_draft().unwrap().expect("draft kept");
    assert_eq!(draft.len(), 1);
    assert_eq!(draft.climbs()[0].grade, "Red");
}

#[test]
fn failed_finish_keeps_the_draft() {
    let env = CliTestEnv::new();
    env.seed_session(&[("Orange", AscentType::Send), ("Red", AscentType::Attempt)]);

    let output = run_bin(&env, &["finish", "--name", "Evening"]);
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("2 climb(s) kept"));

    let draft = env.store().load_draft().unwrap().expect("draft kept");
    assert_eq!(draft.len(), 2);
}

#[test]
fn finishing_an_empty_session_needs_no_backend() {
    let env = CliTestEnv::new();
    env.seed_session(&[]);

    let output = run_bin(&env, &["finish"]);
    assert_success(&["finish"], &output);
    assert!(stdout_of(&output).contains("No climbs logged"));
    assert!(!env.draft_path().exists());
}

#[test]
fn discard_removes_the_draft() {
    let env = CliTestEnv::new();
    env.seed_session(&[("Green", AscentType::Send)]);

    let output = run_bin(&env, &["discard"]);
    assert_success(&["discard"], &output);
    assert!(stdout_of(&output).contains("Discarded session with 1 climb(s)"));
    assert!(!env.draft_path().exists());

    let output = run_bin(&env, &["discard"]);
    assert_success(&["discard"], &output);
    assert!(stdout_of(&output).contains("No open session"));
}

#[test]
fn stats_degrades_when_backend_is_unreachable() {
    let env = CliTestEnv::new();
    let args = ["stats", "--user", "Mark", "--export", "json"];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let json: serde_json::Value =
        serde_json::from_str(&stdout_of(&output)).expect("stats export is JSON");
    assert_eq!(json["user"], "Mark");
    assert_eq!(json["hardest_boulder"], "N/A");
    assert_eq!(json["total_sessions"], 0);
    assert_eq!(json["unavailable"].as_array().map(Vec::len), Some(3));
}

#[test]
fn history_degrades_when_backend_is_unreachable() {
    let env = CliTestEnv::new();

    let args = ["history", "--user", "Mark"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("(could not load history)"));
    assert!(!stdout.contains("No saved sessions"));

    let args = ["history", "--user", "Mark", "--daily", "--export", "json"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);
    let json: serde_json::Value =
        serde_json::from_str(&stdout_of(&output)).expect("history export is JSON");
    assert_eq!(json, serde_json::json!([]));
    assert!(stderr_of(&output).contains("could not load history"));
}

#[test]
fn corrupt_draft_only_blocks_session_commands() {
    let env = CliTestEnv::new();
    fs::create_dir_all(env.draft_path().parent().unwrap()).unwrap();
    fs::write(env.draft_path(), r#"{"user_name": "Mark""#).unwrap();

    let output = run_bin(&env, &["grades"]);
    assert_success(&["grades"], &output);

    let args = ["history", "--user", "Mark"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let output = run_bin(&env, &["show"]);
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("active_session.json"));

    let output = run_bin(&env, &["discard"]);
    assert_success(&["discard"], &output);
    assert!(stdout_of(&output).contains("Discarded unreadable session draft"));
    assert!(!env.draft_path().exists());

    let output = run_bin(&env, &["show"]);
    assert!(stderr_of(&output).contains("no open session"));
}

#[test]
fn finish_is_rejected_while_another_run_holds_the_draft() {
    let env = CliTestEnv::new();
    env.seed_session(&[("Orange", AscentType::Send)]);
    let held = env.store().lock_draft().expect("lock should be free");

    let output = run_bin(&env, &["finish"]);
    assert!(!output.status.success());
    let stderr = stderr_of(&output);
    assert!(stderr.contains("another cragbook command is using the open session"));
    assert!(stderr.contains("already in progress"));

    let output = run_bin(&env, &["log", "Red"]);
    assert!(!output.status.success());

    drop(held);
    let draft = env.store().load_draft().unwrap().expect("draft kept");
    assert_eq!(draft.len(), 1);

    // Lock released: the next run gets as far as the backend.
    let output = run_bin(&env, &["finish"]);
    assert!(stderr_of(&output).contains("1 climb(s) kept"));
}

#[test]
fn broken_log_directory_is_reported_but_not_fatal() {
    let env = CliTestEnv::new();
    // A plain file where the state directory should be
    fs::write(env.xdg_state.join("cragbook"), "not a directory").unwrap();

    let output = run_bin(&env, &["grades"]);
    assert_success(&["grades"], &output);
    assert!(stderr_of(&output).contains("warning: file logging disabled"));
    assert!(stdout_of(&output).contains("Stonegoat (Bouldering)"));
}
