//! Integration tests for the `gridlet` CLI binary.
//!
//! Argument parsing, help output, shell completions, configuration errors,
//! and a dry run against a wiremock portal.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const GRIDLET_VARS: [&str; 14] = [
    "GRIDLET_CONFIG",
    "GRIDLET_DRY_RUN",
    "GRIDLET_QUIET",
    "GRIDLET_LOG_QUIET",
    "GRIDLET_VERBOSITY",
    "GRIDLET_LOG_LEVEL",
    "GRIDLET_ENPHASE_USER",
    "GRIDLET_ENPHASE_PASSWORD",
    "GRIDLET_ENPHASE_URL_BASE",
    "GRIDLET_TOMORROW_API_KEY",
    "GRIDLET_TOMORROW_LOCATION",
    "GRIDLET_TOMORROW_URL_BASE",
    "GRIDLET_TIMEZONE",
    "GRIDLET_TIMEOUT_SECS",
];

/// Build a [`Command`] for the `gridlet` binary with env isolation.
///
/// Clears all `GRIDLET_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn gridlet_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("gridlet");
    cmd.env("HOME", "/tmp/gridlet-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/gridlet-cli-test-nonexistent")
        .env_remove("RUST_LOG");
    for var in GRIDLET_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    gridlet_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("--dry-run")
            .and(predicate::str::contains("--enphase-user"))
            .and(predicate::str::contains("--tomorrow-location"))
            .and(predicate::str::contains("completions")),
    );
}

#[test]
fn test_version_flag() {
    gridlet_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gridlet"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    gridlet_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    gridlet_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_unknown_flag() {
    let output = gridlet_cmd().arg("--foobar").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("foobar"), "Expected error mentioning the flag:\n{text}");
}

#[test]
fn test_missing_credentials() {
    gridlet_cmd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("enphase_user").and(predicate::str::contains("--enphase-user")));
}

#[test]
fn test_missing_password_from_env_user() {
    gridlet_cmd()
        .env("GRIDLET_ENPHASE_USER", "me@example.com")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("GRIDLET_ENPHASE_PASSWORD"));
}

#[test]
fn test_invalid_timezone() {
    gridlet_cmd()
        .args([
            "--enphase-user",
            "me@example.com",
            "--enphase-password",
            "hunter2",
            "--timezone",
            "Mars/Olympus_Mons",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("timezone"));
}

#[test]
fn test_missing_config_file() {
    gridlet_cmd()
        .args(["--config", "/tmp/gridlet-cli-test-nonexistent/gridlet.toml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_connection_refused() {
    gridlet_cmd()
        .args([
            "--enphase-user",
            "me@example.com",
            "--enphase-password",
            "hunter2",
            "--enphase-url-base",
            "http://127.0.0.1:1",
        ])
        .assert()
        .code(7);
}

// ── End to end ──────────────────────────────────────────────────────

async fn mount_portal(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<form action="/login/login"><input type="hidden" name="authenticity_token" value="t"></form>"#,
            "text/html",
        ))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login/login"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/web/12345?v=99999")
                .insert_header("set-cookie", "_enlighten_4_session=sess42; Path=/"),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pv/settings/12345/battery_config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "battery_config": { "usage": "self-consumption" }
        })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dry_run_from_config_file() {
    let server = MockServer::start().await;
    mount_portal(&server).await;
    Mock::given(method("PUT"))
        .and(path("/pv/settings/12345/battery_config"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "enphase_user = \"me@example.com\"\n\
         enphase_password = \"hunter2\"\n\
         enphase_url_base = \"{}\"",
        server.uri()
    )
    .unwrap();

    let config_path = file.path().to_path_buf();
    let output = tokio::task::spawn_blocking(move || {
        gridlet_cmd()
            .args(["-n", "--config"])
            .arg(&config_path)
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(
        output.status.success(),
        "Expected success:\n{}",
        combined_output(&output)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_login_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<form action="/login/login"></form>"#,
            "text/html",
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Invalid email or password"))
        .mount(&server)
        .await;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        gridlet_cmd()
            .env("GRIDLET_ENPHASE_USER", "me@example.com")
            .env("GRIDLET_ENPHASE_PASSWORD", "wrong")
            .env("GRIDLET_ENPHASE_URL_BASE", uri)
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("login failed"));
}
