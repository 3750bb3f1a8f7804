//! Integration tests for CLI argument handling
//!
//! Only paths that exit before the terminal UI starts are run as a process.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_npsites"))
        .args(args)
        .env_remove("MAPQUEST_API_KEY")
        .output()
        .expect("Failed to execute npsites")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("npsites"), "Help should mention npsites");
    assert!(stdout.contains("--state"), "Help should mention --state flag");
    assert!(stdout.contains("--cache-file"), "Help should mention --cache-file");
    assert!(
        !stdout.contains("--base-url"),
        "Hidden flags should not be listed"
    );
}

#[test]
fn test_invalid_ttl_prints_error_and_exits() {
    let output = run_cli(&["--cache-ttl-hours", "soon"]);
    assert!(!output.status.success(), "Expected invalid TTL to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid") || stderr.contains("Invalid"),
        "Should print error message about invalid TTL: {}",
        stderr
    );
}

#[test]
fn test_huge_ttl_is_rejected_before_startup() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let cache_file = dir.path().join("cache.json");

    for hours in ["9223372036854775807", "18446744073709551615"] {
        let output = run_cli(&[
            "--cache-file",
            cache_file.to_str().unwrap(),
            "--cache-ttl-hours",
            hours,
        ]);

        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            stderr.contains("out of range"),
            "Unexpected stderr for {}: {}",
            hours,
            stderr
        );
        assert!(!stderr.contains("panicked"), "Should not panic: {}", stderr);
    }
}

#[test]
fn test_zero_timeout_is_rejected_before_startup() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let cache_file = dir.path().join("cache.json");

    let output = run_cli(&[
        "--cache-file",
        cache_file.to_str().unwrap(),
        "--timeout-secs",
        "0",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("timeout"), "Unexpected stderr: {}", stderr);
    assert!(!cache_file.exists(), "No cache should be written");
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use npsites::cache::CachePolicy;
    use npsites::cli::{Cli, CliError, StartupConfig};

    #[test]
    fn test_cli_no_args_uses_defaults() {
        let cli = Cli::parse_from(["npsites"]);
        assert!(cli.state.is_none());
        assert!(cli.cache_ttl_hours.is_none());
        assert!(!cli.clear_cache);
    }

    #[test]
    fn test_cli_state_with_spaces() {
        let cli = Cli::parse_from(["npsites", "--state", "New York"]);
        assert_eq!(cli.state.as_deref(), Some("New York"));
    }

    #[test]
    fn test_startup_config_clear_cache_flag() {
        let cli = Cli::parse_from(["npsites", "--cache-file", "c.json", "--clear-cache"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert!(config.clear_cache);
        assert_eq!(config.cache_policy, CachePolicy::NeverExpire);
    }

    #[test]
    fn test_startup_config_explicit_log_file() {
        let cli = Cli::parse_from([
            "npsites",
            "--cache-file",
            "c.json",
            "--log-file",
            "/tmp/npsites.log",
        ]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.log_path, std::path::PathBuf::from("/tmp/npsites.log"));
    }

    #[test]
    fn test_startup_config_rejects_ttl_beyond_i64() {
        let cli = Cli::parse_from([
            "npsites",
            "--cache-file",
            "c.json",
            "--cache-ttl-hours",
            "18446744073709551615",
        ]);
        let result = StartupConfig::from_cli(&cli);
        assert!(matches!(result, Err(CliError::InvalidTtl(u64::MAX))));
    }

    #[test]
    fn test_startup_config_timeout() {
        let cli = Cli::parse_from(["npsites", "--cache-file", "c.json", "--timeout-secs", "5"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.timeout, std::time::Duration::from_secs(5));
    }
}
