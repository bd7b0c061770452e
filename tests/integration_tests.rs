//! Integration tests for the delve CLI.
//!
//! These exercise the binary surface only: argument parsing, config
//! resolution, and the offline failure paths. Anything needing live API
//! keys stays out of CI.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a delve Command with a clean environment.
fn delve() -> Command {
    let mut cmd = Command::cargo_bin("delve").unwrap();
    cmd.env_remove("OPENAI_API_KEY")
        .env_remove("TAVILY_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_delve_help() {
        delve()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("research"));
    }

    #[test]
    fn test_delve_version() {
        delve().arg("--version").assert().success();
    }

    #[test]
    fn test_run_requires_query() {
        delve().arg("run").assert().failure();
    }

    #[test]
    fn test_unknown_subcommand_fails() {
        delve().arg("interrogate").assert().failure();
    }
}

// =============================================================================
// Missing Credentials
// =============================================================================

mod credentials {
    use super::*;

    #[test]
    fn test_run_without_openai_key_fails_with_hint() {
        let dir = temp_dir();
        delve()
            .current_dir(dir.path())
            .args(["run", "test query", "--yes"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_run_without_tavily_key_fails_with_hint() {
        let dir = temp_dir();
        delve()
            .current_dir(dir.path())
            .env("OPENAI_API_KEY", "sk-test-not-real")
            .args(["run", "test query", "--yes"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("TAVILY_API_KEY"));
    }

    #[test]
    fn test_plan_without_openai_key_fails_with_hint() {
        let dir = temp_dir();
        delve()
            .current_dir(dir.path())
            .args(["plan", "test query"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("OPENAI_API_KEY"));
    }
}

// =============================================================================
// Config Command (works offline)
// =============================================================================

mod config_cmd {
    use super::*;

    #[test]
    fn test_config_shows_defaults() {
        let dir = temp_dir();
        delve()
            .current_dir(dir.path())
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("model = \"gpt-4o-mini\""))
            .stdout(predicate::str::contains("max_replans = 2"))
            .stdout(predicate::str::contains("No delve.toml found"));
    }

    #[test]
    fn test_config_picks_up_local_file() {
        let dir = temp_dir();
        fs::write(
            dir.path().join("delve.toml"),
            "model = \"gpt-4o\"\nmax_replans = 5\n",
        )
        .unwrap();

        delve()
            .current_dir(dir.path())
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("model = \"gpt-4o\""))
            .stdout(predicate::str::contains("max_replans = 5"));
    }

    #[test]
    fn test_config_explicit_path() {
        let dir = temp_dir();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "use_estimates = true\n").unwrap();

        delve()
            .arg("config")
            .arg("--config")
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("use_estimates = true"));
    }

    #[test]
    fn test_config_missing_explicit_path_fails() {
        let dir = temp_dir();
        delve()
            .arg("config")
            .arg("--config")
            .arg(dir.path().join("nope.toml"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to read config file"));
    }

    #[test]
    fn test_config_rejects_invalid_file() {
        let dir = temp_dir();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "not_a_real_option = 1\n").unwrap();

        delve()
            .arg("config")
            .arg("--config")
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to parse config file"));
    }
}
