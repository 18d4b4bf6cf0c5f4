// hashgrab/tests/cli_integration.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MD5_OF_TEST: &str = "098f6bcd4621d373cade4e832627b4f6";
const SHA256_OF_TEST: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

/// Command isolated from the user's config files and HG_* variables.
fn hashgrab(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("hashgrab").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("HG_CONCURRENCY")
        .env_remove("HG_TIMEOUT")
        .env_remove("HG_HASHER")
        .env_remove("HG_USER_AGENT")
        .env_remove("HG_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create a test URL file
fn create_test_urls_file(urls: &[&str]) -> NamedTempFile {
    let file = NamedTempFile::new().expect("Failed to create temp file");
    fs::write(file.path(), urls.join("\n")).expect("Failed to write to temp file");
    file
}

async fn serve_test_body() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(ResponseTemplate::new(200).set_body_string("test"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    server
}

/// Run a prepared command off the async runtime.
async fn run(cmd: Command) -> assert_cmd::assert::Assert {
    tokio::task::spawn_blocking(move || {
        let mut cmd = cmd;
        cmd.assert()
    })
    .await
    .expect("command thread panicked")
}

#[test]
fn test_help_lists_flags() {
    let home = TempDir::new().unwrap();
    hashgrab(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--parallel"))
        .stdout(predicate::str::contains("--file"))
        .stdout(predicate::str::contains("--hasher"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn test_zero_parallel_is_rejected() {
    let home = TempDir::new().unwrap();
    let output = hashgrab(&home)
        .args(["--parallel", "0", "http://example.com"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        stderr.trim_end(),
        "Error: Number of parallel requests should be greater than 0"
    );
    assert!(output.stdout.is_empty());
}

#[test]
fn test_overflowing_timeout_is_rejected() {
    let home = TempDir::new().unwrap();
    let output = hashgrab(&home)
        .args(["--timeout", "307445734561825861m", "http://127.0.0.1:1"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        stderr.trim_end(),
        "Error: configuration error: invalid timeout '307445734561825861m'"
    );
    assert!(output.stdout.is_empty());
}

#[test]
fn test_negative_parallel_is_rejected() {
    let home = TempDir::new().unwrap();
    hashgrab(&home)
        .args(["-p", "-3", "http://example.com"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Number of parallel requests should be greater than 0",
        ));
}

#[test]
fn test_missing_urls_is_rejected() {
    let home = TempDir::new().unwrap();
    let output = hashgrab(&home).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&output.stderr).trim_end(),
        "Error: Please provide at least one URL"
    );
}

#[test]
fn test_empty_url_file_is_rejected() {
    let home = TempDir::new().unwrap();
    let file = create_test_urls_file(&["# nothing here", ""]);

    hashgrab(&home)
        .args(["--file", file.path().to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Please provide at least one URL"));
}

#[test]
fn test_unknown_hasher_is_rejected() {
    let home = TempDir::new().unwrap();
    hashgrab(&home)
        .args(["--hasher", "crc32", "http://example.com"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown hasher 'crc32'"));
}

#[test]
fn test_unreachable_url_prints_failure_and_exits_zero() {
    let home = TempDir::new().unwrap();
    hashgrab(&home)
        .args(["--parallel", "1", "http://127.0.0.1:1/"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "couldn't fetch http://127.0.0.1:1/: ",
        ));
}

#[test]
fn test_pretty_header_shows_version_and_settings() {
    let home = TempDir::new().unwrap();
    hashgrab(&home)
        .args(["--pretty", "-p", "1", "http://127.0.0.1:1/"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "hashgrab v{}",
            env!("CARGO_PKG_VERSION")
        )))
        .stdout(predicate::str::contains("Hasher: md5 | Concurrency: 1"))
        .stdout(predicate::str::contains("FAILED"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_prints_url_and_md5() {
    let server = serve_test_body().await;
    let home = TempDir::new().unwrap();
    let url = format!("{}/test", server.uri());

    let mut cmd = hashgrab(&home);
    cmd.arg(&url);

    run(cmd)
        .await
        .success()
        .stdout(predicate::str::diff(format!("{} {}\n", url, MD5_OF_TEST)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_mixed_results_one_line_each() {
    let server = serve_test_body().await;
    let home = TempDir::new().unwrap();
    let ok = format!("{}/test", server.uri());
    let missing = format!("{}/missing", server.uri());

    let mut cmd = hashgrab(&home);
    cmd.args(["-p", "2", ok.as_str(), missing.as_str(), ok.as_str()]);

    let assert = run(cmd).await.success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let lines: Vec<&str> = stdout.lines().collect();

    assert_eq!(lines.len(), 3);
    let ok_line = format!("{} {}", ok, MD5_OF_TEST);
    assert_eq!(lines.iter().filter(|l| **l == ok_line).count(), 2);
    let missing_line = format!("couldn't fetch {}: {} returned HTTP 404", missing, missing);
    assert!(lines.contains(&missing_line.as_str()));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scheme_less_url_is_fetched_over_http() {
    let server = serve_test_body().await;
    let home = TempDir::new().unwrap();
    let bare = format!("{}/test", server.uri().trim_start_matches("http://"));

    let mut cmd = hashgrab(&home);
    cmd.arg(&bare);

    run(cmd)
        .await
        .success()
        .stdout(predicate::str::diff(format!("{} {}\n", bare, MD5_OF_TEST)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sha256_hasher_flag() {
    let server = serve_test_body().await;
    let home = TempDir::new().unwrap();
    let url = format!("{}/test", server.uri());

    let mut cmd = hashgrab(&home);
    cmd.args(["--hasher", "sha256", url.as_str()]);

    run(cmd)
        .await
        .success()
        .stdout(predicate::str::diff(format!("{} {}\n", url, SHA256_OF_TEST)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_urls_from_file() {
    let server = serve_test_body().await;
    let home = TempDir::new().unwrap();
    let url = format!("{}/test", server.uri());
    let file = create_test_urls_file(&["# mirrors", url.as_str(), "", url.as_str()]);

    let mut cmd = hashgrab(&home);
    cmd.args(["--file", file.path().to_str().unwrap()]);

    let assert = run(cmd).await.success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert_eq!(stdout.lines().count(), 2);
    assert!(stdout
        .lines()
        .all(|l| l == format!("{} {}", url, MD5_OF_TEST)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_output() {
    let server = serve_test_body().await;
    let home = TempDir::new().unwrap();
    let url = format!("{}/test", server.uri());

    let mut cmd = hashgrab(&home);
    cmd.args(["--json", url.as_str()]);

    run(cmd)
        .await
        .success()
        .stdout(predicate::str::contains(format!("\"url\":\"{}\"", url)))
        .stdout(predicate::str::contains(format!("\"hash\":\"{}\"", MD5_OF_TEST)))
        .stdout(predicate::str::contains("\"error\"").not());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_timeout_flag_reports_timeout() {
    let server = serve_test_body().await;
    let home = TempDir::new().unwrap();
    let url = format!("{}/slow", server.uri());

    let mut cmd = hashgrab(&home);
    cmd.args(["--timeout", "200ms", url.as_str()]);

    run(cmd)
        .await
        .success()
        .stdout(predicate::str::starts_with(format!("couldn't fetch {}: timeout", url)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_config_file_sets_hasher() {
    let server = serve_test_body().await;
    let home = TempDir::new().unwrap();
    let url = format!("{}/test", server.uri());
    fs::write(
        home.path().join(".hashgrab.toml"),
        "[defaults]\nhasher = \"sha256\"\nconcurrency = 2\n",
    )
    .unwrap();

    let mut cmd = hashgrab(&home);
    cmd.arg(&url);

    run(cmd)
        .await
        .success()
        .stdout(predicate::str::diff(format!("{} {}\n", url, SHA256_OF_TEST)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_env_overrides_config_file() {
    let server = serve_test_body().await;
    let home = TempDir::new().unwrap();
    let url = format!("{}/test", server.uri());
    fs::write(
        home.path().join(".hashgrab.toml"),
        "[defaults]\nhasher = \"sha256\"\n",
    )
    .unwrap();

    let mut cmd = hashgrab(&home);
    cmd.env("HG_HASHER", "md5").arg(&url);

    run(cmd)
        .await
        .success()
        .stdout(predicate::str::diff(format!("{} {}\n", url, MD5_OF_TEST)));
}

#[test]
fn test_missing_explicit_config_fails() {
    let home = TempDir::new().unwrap();
    hashgrab(&home)
        .args(["--config", "/nonexistent/hashgrab.toml", "http://example.com"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to load config file"));
}
