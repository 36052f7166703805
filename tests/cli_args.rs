//! Integration tests for CLI argument handling
//!
//! Runs the built binary with a controlled environment.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
///
/// Config variables are cleared so the host environment cannot leak in, and
/// the working directory is a fresh temp dir so no `.env` file is picked up.
fn run_cli(args: &[&str], env: &[(&str, &str)]) -> std::process::Output {
    let dir = std::env::temp_dir();
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_weather-cache"));
    cmd.current_dir(dir).args(args);
    for var in [
        "API_KEY",
        "REDIS_URL",
        "CACHE_TTL_SECS",
        "WEATHER_BASE_URL",
        "WEATHER_UNIT_GROUP",
        "CACHE_TIMEOUT_MS",
        "ORIGIN_TIMEOUT_SECS",
        "PORT",
    ] {
        cmd.env_remove(var);
    }
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.output().expect("Failed to execute weather-cache")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"], &[]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("weather-cache"), "Help should mention weather-cache");
    assert!(stdout.contains("serve"), "Help should list the serve command");
    assert!(stdout.contains("evict"), "Help should list the evict command");
    assert!(stdout.contains("--redis-url"), "Help should mention --redis-url");
}

#[test]
fn test_missing_api_key_prints_error_and_exits() {
    let output = run_cli(&["get", "London"], &[]);
    assert!(!output.status.success(), "Expected missing API key to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("API_KEY"),
        "Should print error message about the API key: {}",
        stderr
    );
}

#[test]
fn test_zero_ttl_from_env_is_rejected() {
    let output = run_cli(
        &["get", "London"],
        &[("API_KEY", "k"), ("CACHE_TTL_SECS", "0")],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("TTL"), "Should explain the TTL problem: {}", stderr);
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let output = run_cli(
        &["--base-url", "ftp://example.com/", "get", "London"],
        &[("API_KEY", "k")],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("base URL"), "{}", stderr);
}

#[test]
fn test_unreachable_origin_fails_without_leaking_key() {
    let output = run_cli(
        &[
            "--base-url",
            "http://127.0.0.1:1/",
            "--origin-timeout-secs",
            "2",
            "get",
            "London",
        ],
        &[("API_KEY", "very-secret-key")],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unreachable"), "{}", stderr);
    assert!(!stderr.contains("very-secret-key"), "API key leaked: {}", stderr);
}

#[test]
fn test_evict_with_memory_cache_succeeds() {
    let output = run_cli(&["evict", "London"], &[("API_KEY", "k")]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("London"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let output = run_cli(&["forecast", "London"], &[("API_KEY", "k")]);
    assert!(!output.status.success());
}
