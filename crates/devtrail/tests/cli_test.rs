//! Integration tests for the `devtrail` CLI binary.
//!
//! Argument parsing, help, completions, and error handling run without a
//! backend; listing and creation run against a wiremock backend.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `devtrail` binary with env isolation.
///
/// Clears all `DEVTRAIL_*` env vars and points config and data
/// directories at a nonexistent path so tests never touch the user's
/// real configuration, keyring, or token file.
fn devtrail_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("devtrail");
    cmd.env("HOME", "/tmp/devtrail-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/devtrail-cli-test-nonexistent")
        .env("XDG_DATA_HOME", "/tmp/devtrail-cli-test-nonexistent")
        .env("TZ", "UTC")
        .env("NO_COLOR", "1")
        .env_remove("DBUS_SESSION_BUS_ADDRESS")
        .env_remove("RUST_LOG")
        .env_remove("DEVTRAIL_PROFILE")
        .env_remove("DEVTRAIL_BACKEND")
        .env_remove("DEVTRAIL_OUTPUT")
        .env_remove("DEVTRAIL_INSECURE")
        .env_remove("DEVTRAIL_TIMEOUT")
        .env_remove("DEVTRAIL_ACCESS_TOKEN");
    cmd
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn events_body() -> serde_json::Value {
    json!([
        {
            "event_id": 1,
            "user_email": "ann@example.com",
            "user_name": "Ann",
            "move_time": "2024-12-12 23:59:59",
            "loc_name": "Test Laboratory",
            "company": "Acme",
            "dev_name": "Scope"
        },
        {
            "event_id": 2,
            "parent_event_id": 1,
            "user_email": "ann@example.com",
            "loc_name": "Shelf B"
        },
        {
            "event_id": 3,
            "user_email": "bob@example.com",
            "loc_name": "Office",
            "company": "Initech"
        }
    ])
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = devtrail_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    devtrail_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("events")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    devtrail_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("devtrail"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    devtrail_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    devtrail_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_events_list_without_backend() {
    devtrail_cmd()
        .args(["events", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No backend address configured"));
}

#[test]
fn test_unknown_profile() {
    devtrail_cmd()
        .args(["--profile", "nope", "events", "list"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Profile 'nope' not found"));
}

#[test]
fn test_invalid_backend_url() {
    devtrail_cmd()
        .args(["--backend", "not a url", "events", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid backend"));
}

#[test]
fn test_config_path() {
    devtrail_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_create_device_requires_payload() {
    let output = devtrail_cmd()
        .args(["--backend", "http://127.0.0.1:9", "devices", "create"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Listing ─────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_events_list_table_sends_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(events_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = devtrail_cmd();
    cmd.args(["--backend", &server.uri(), "--token", "tok-1", "events", "list"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Email"));
    assert!(stdout.contains("Date/Time"));
    assert!(stdout.contains("12/12/2024, 23:59"));
    assert!(stdout.contains("Test Laboratory"));
    // Child rows stay collapsed by default.
    assert!(!stdout.contains("Shelf B"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_events_list_csv_filtered_and_expanded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(events_body()))
        .mount(&server)
        .await;

    let mut cmd = devtrail_cmd();
    cmd.env("DEVTRAIL_ACCESS_TOKEN", "env-token").args([
        "--backend",
        &server.uri(),
        "-o",
        "csv",
        "events",
        "list",
        "--filter",
        "Email=ANN",
        "--expand",
    ]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Email,User name,Date/Time,Location,Company,Device\n\
         ann@example.com,Ann,\"12/12/2024, 23:59\",Test Laboratory,Acme,Scope\n\
         ann@example.com,,,Shelf B,,\n"
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        requests[0].headers.get("authorization").unwrap(),
        "Bearer env-token"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_events_list_exports_csv() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(events_body()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("events.csv");

    let mut cmd = devtrail_cmd();
    cmd.args(["--backend", &server.uri(), "-q", "events", "list", "--sort", "company:desc"])
        .arg("--export")
        .arg(&target);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let written = std::fs::read_to_string(&target).unwrap();
    let lines: Vec<_> = written.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("bob@example.com"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_device_events_failure_shows_literal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices/42/events"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut cmd = devtrail_cmd();
    cmd.args(["--backend", &server.uri(), "devices", "events", "42"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load events."), "{stderr}");
    assert!(stderr.contains("Please try again later."), "{stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_device_events_not_found_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices/7/events"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut cmd = devtrail_cmd();
    cmd.args(["--backend", &server.uri(), "devices", "events", "7"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_device_events_json_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices/7/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "event_id": "e1", "user_id": 5, "loc": "Dock" }
        ])))
        .mount(&server)
        .await;

    let mut cmd = devtrail_cmd();
    cmd.args(["--backend", &server.uri(), "-o", "json-compact", "devices", "events", "7"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed, json!([{ "event_id": "e1", "user_id": "5", "loc": "Dock" }]));
}

// ── Creation ────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_device_create_failure_alerts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let mut cmd = devtrail_cmd();
    cmd.args([
        "--backend",
        &server.uri(),
        "devices",
        "create",
        "--data",
        r#"{"dev_name": "scope"}"#,
    ]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("✗ Create device failed: 400 Bad Request"),
        "{stderr}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_event_create_posts_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .and(body_json(json!({
            "dev_id": 4,
            "user_id": 2,
            "move_time": "2024-12-12T23:59:59",
            "loc_name": "Lab",
            "company": "Acme",
            "comment": ""
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "event_id": 99 })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = devtrail_cmd();
    cmd.args([
        "--backend",
        &server.uri(),
        "-o",
        "plain",
        "events",
        "create",
        "--dev-id",
        "4",
        "--user-id",
        "2",
        "--location",
        "Lab",
        "--company",
        "Acme",
        "--at",
        "2024-12-12T23:59:59Z",
    ]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "99");
}
