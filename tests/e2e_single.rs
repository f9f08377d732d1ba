
use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tempfile::tempdir;

use support_single::{run_ratefire, spawn_http_server_or_skip};

fn write_config(dir: &tempfile::TempDir, name: &str, contents: &str) -> Result<PathBuf, String> {
    let path = dir.path().join(name);
    fs::write(&path, contents).map_err(|err| format!("write config failed: {}", err))?;
    Ok(path)
}

fn toml_config(url: &str) -> String {
    format!(
        r#"
baseUrls = ["{url}"]

[execution]
durationSeconds = 30
requestsPerSecond = 1

[parameterGenerators.userId]
type = "formattedInt"
min = 7
max = 7
format = "user_{{}}"

[endpoints.getUser]
path = "/users/{{id}}"

[endpoints.getUser.pathParameters.id]
"$ref" = "userId"

[endpoints.health]
path = "/health"
"#
    )
}

#[test]
fn e2e_single_json_report() -> Result<(), String> {
    let Some((url, server)) = spawn_http_server_or_skip()? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let config = write_config(&dir, "ratefire.toml", &toml_config(&url))?;

    let output = run_ratefire([
        config.to_string_lossy().as_ref(),
        "--duration",
        "1",
        "--rate",
        "10",
        "--format",
        "json",
    ])?;
    if !output.status.success() {
        return Err(format!(
            "stdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        ));
    }

    let report: Value = serde_json::from_slice(&output.stdout)
        .map_err(|err| format!("report is not JSON: {}", err))?;
    let total = report
        .pointer("/total_requests")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    if total == 0 {
        return Err(format!("Expected requests in report: {}", report));
    }
    if report.pointer("/failed_requests").and_then(Value::as_u64) != Some(0) {
        return Err(format!("Expected no failures: {}", report));
    }
    if report.pointer("/status_codes/200").and_then(Value::as_u64) != Some(total) {
        return Err(format!("Expected every response to be 200: {}", report));
    }
    if report.pointer("/configured_duration_s").and_then(Value::as_u64) != Some(1) {
        return Err(format!("Expected duration override: {}", report));
    }

    let lines = server.request_lines();
    if !lines.iter().any(|line| line.starts_with("GET /users/user_7 ")) {
        return Err(format!("Expected substituted path, saw {:?}", lines));
    }
    if !lines.iter().any(|line| line.starts_with("GET /health ")) {
        return Err(format!("Expected round-robin to reach /health, saw {:?}", lines));
    }
    Ok(())
}

#[test]
fn e2e_single_text_report() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip()? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let config = format!(
        r#"{{
  "baseUrls": ["{url}"],
  "execution": {{ "durationSeconds": 1, "requestsPerSecond": 5 }},
  "endpoints": {{ "ping": {{ "path": "/ping" }} }}
}}"#
    );
    let path = write_config(&dir, "load.json", &config)?;

    let output = run_ratefire([path.to_string_lossy().as_ref(), "--no-color"])?;
    if !output.status.success() {
        return Err(format!(
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("--- Load Report ---") {
        return Err(format!("Missing report header: {}", stdout));
    }
    if !stdout.contains("Status 200:") {
        return Err(format!("Missing status code breakdown: {}", stdout));
    }
    Ok(())
}

#[test]
fn e2e_single_rejects_invalid_config() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = write_config(
        &dir,
        "broken.toml",
        "baseUrls = []\n[endpoints.ping]\npath = \"/ping\"\n",
    )?;

    let output = run_ratefire([path.to_string_lossy().as_ref()])?;
    if output.status.success() {
        return Err("Expected a config without base URLs to fail".to_owned());
    }
    Ok(())
}

#[test]
fn e2e_single_missing_config_file() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let missing = dir.path().join("nope.toml");

    let output = run_ratefire([missing.to_string_lossy().as_ref()])?;
    if output.status.success() {
        return Err("Expected a missing config file to fail".to_owned());
    }
    Ok(())
}
