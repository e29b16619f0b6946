use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;

use tokio::process::Command;
use wiremock::MockServer;

/// Base URL of a mock server.
pub fn url_of(server: &MockServer) -> String {
    format!("http://127.0.0.1:{}", server.address().port())
}

/// Write a config file into `home` and return its path.
pub fn write_config(home: &Path, yaml: &str) -> PathBuf {
    let path = home.join("config.yaml");
    fs::write(&path, yaml).expect("Failed to write config");
    path
}

/// Run the CLI binary with an isolated HOME and data directories.
pub async fn run_cli(args: &[&str], home: &Path) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cdpm"));
    cmd.args(args);
    cmd.env("HOME", home);
    cmd.env("XDG_CONFIG_HOME", home.join("config"));
    cmd.env("XDG_DATA_HOME", home.join("data"));
    cmd.env_remove("CDPM_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd.output().await.expect("Failed to execute CLI")
}

/// Run the CLI and expect success, returning stdout.
pub async fn run_cli_success(args: &[&str], home: &Path) -> String {
    let output = run_cli(args, home).await;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI and expect failure, returning stderr.
pub async fn run_cli_failure(args: &[&str], home: &Path) -> String {
    let output = run_cli(args, home).await;
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Parse JSON-lines output.
pub fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("stdout line is not JSON"))
        .collect()
}
