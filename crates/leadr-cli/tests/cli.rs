//! CLI tests against a mock LEADR service.
//!
//! Each test runs the `leadr` binary with its own credential store so runs
//! never touch the user's data directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Env {
    _dir: TempDir,
    store: PathBuf,
    api_url: Option<String>,
}

impl Env {
    fn new(server: Option<&MockServer>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("credentials.json");
        Self {
            _dir: dir,
            store,
            api_url: server.map(|s| format!("http://127.0.0.1:{}", s.address().port())),
        }
    }

    /// Run the CLI binary with arguments.
    async fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_leadr"));
        cmd.args(args)
            .env_remove("LEADR_API_URL")
            .env_remove("LEADR_PLATFORM")
            .env_remove("RUST_LOG")
            .env("LEADR_GAME_ID", "gam_cli")
            .env("LEADR_STORE", &self.store)
            .env("NO_COLOR", "1");
        if let Some(api_url) = &self.api_url {
            cmd.env("LEADR_API_URL", api_url);
        }
        tokio::task::spawn_blocking(move || cmd.output().expect("Failed to execute CLI"))
            .await
            .unwrap()
    }

    /// Run the CLI and expect success.
    async fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args).await;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run the CLI and expect failure.
    async fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args).await;
        if output.status.success() {
            panic!("CLI command should have failed: {:?}", args);
        }
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    fn store(&self) -> &Path {
        &self.store
    }
}

fn session_json(access: &str, refresh: &str) -> Value {
    json!({
        "id": "ses_cli",
        "device_id": "dev_cli",
        "account_id": "acc_cli",
        "status": "active",
        "expires_in": 3600,
        "access_token": access,
        "refresh_token": refresh
    })
}

async fn mount_session(server: &MockServer, access: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/client/sessions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(session_json(access, "r1")))
        .mount(server)
        .await;
}

fn show_json(stdout: &str) -> Value {
    serde_json::from_str(stdout.trim()).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_session_start_and_show() {
    let server = MockServer::start().await;
    mount_session(&server, "a1").await;
    let env = Env::new(Some(&server));

    let stdout = env.run_success(&["session", "start", "--platform", "linux"]).await;
    assert!(stdout.contains("ses_cli"));
    assert!(stdout.contains("dev_cli"));
    assert!(env.store().exists());

    let status = show_json(&env.run_success(&["session", "show", "--json"]).await);
    assert_eq!(status["has_token"], true);
    assert_eq!(status["expired"], false);
    assert!(status["expires_in"].as_i64().unwrap() > 3500);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_session_start_sends_game_and_platform() {
    let server = MockServer::start().await;
    let env = Env::new(Some(&server));
    let fingerprint = env.run_success(&["fingerprint"]).await;

    Mock::given(method("POST"))
        .and(path("/v1/client/sessions"))
        .and(body_json(json!({
            "game_id": "gam_cli",
            "client_fingerprint": fingerprint.trim(),
            "platform": "switch"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(session_json("a1", "r1")))
        .expect(1)
        .mount(&server)
        .await;

    env.run_success(&["session", "start", "--platform", "switch"]).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_session_clear_keeps_fingerprint() {
    let server = MockServer::start().await;
    mount_session(&server, "a1").await;
    let env = Env::new(Some(&server));

    env.run_success(&["session", "start"]).await;
    let before = show_json(&env.run_success(&["session", "show", "--json"]).await);

    env.run_success(&["session", "clear"]).await;
    let after = show_json(&env.run_success(&["session", "show", "--json"]).await);

    assert_eq!(after["has_token"], false);
    assert_eq!(after["expires_at"], Value::Null);
    assert_eq!(before["fingerprint"], after["fingerprint"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_session_refresh() {
    let server = MockServer::start().await;
    mount_session(&server, "a1").await;

    Mock::given(method("POST"))
        .and(path("/v1/client/sessions/refresh"))
        .and(header("authorization", "Bearer r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json("a2", "r2")))
        .expect(1)
        .mount(&server)
        .await;

    let env = Env::new(Some(&server));
    env.run_success(&["session", "start"]).await;
    env.run_success(&["session", "refresh"]).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_session_refresh_without_session() {
    let server = MockServer::start().await;
    let env = Env::new(Some(&server));

    let stderr = env.run_failure(&["session", "refresh"]).await;
    assert!(stderr.contains("No active session"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_request_starts_session_on_demand() {
    let server = MockServer::start().await;
    mount_session(&server, "a-auto").await;

    Mock::given(method("GET"))
        .and(path("/v1/client/boards"))
        .and(header("authorization", "Bearer a-auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "brd_1"}])))
        .expect(1)
        .mount(&server)
        .await;

    let env = Env::new(Some(&server));
    let stdout = env
        .run_success(&["request", "get", "/v1/client/boards", "--compact"])
        .await;

    assert_eq!(show_json(&stdout), json!([{"id": "brd_1"}]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_request_with_body_and_nonce() {
    let server = MockServer::start().await;
    mount_session(&server, "a1").await;

    Mock::given(method("GET"))
        .and(path("/v1/client/nonce"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nonce": "n-cli"})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/client/scores"))
        .and(header("leadr-client-nonce", "n-cli"))
        .and(body_json(json!({"board_id": "brd_1", "value": 7})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "scr_1"})))
        .expect(1)
        .mount(&server)
        .await;

    let env = Env::new(Some(&server));
    let stdout = env
        .run_success(&[
            "request",
            "POST",
            "/v1/client/scores",
            "--body",
            r#"{"board_id":"brd_1","value":7}"#,
            "--nonce",
        ])
        .await;

    assert_eq!(show_json(&stdout)["id"], "scr_1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_request_api_error() {
    let server = MockServer::start().await;
    mount_session(&server, "a1").await;

    Mock::given(method("GET"))
        .and(path("/v1/client/boards/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Board not found"})))
        .mount(&server)
        .await;

    let env = Env::new(Some(&server));
    let stderr = env
        .run_failure(&["request", "GET", "/v1/client/boards/missing"])
        .await;

    assert!(stderr.contains("Board not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_request_rejects_bad_body() {
    let env = Env::new(None);
    let stderr = env
        .run_failure(&[
            "request",
            "POST",
            "/v1/client/scores",
            "--api-url",
            "https://api.test",
            "--body",
            "{not json",
        ])
        .await;

    assert!(stderr.contains("--body is not valid JSON"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_nonce_command() {
    let server = MockServer::start().await;
    mount_session(&server, "a1").await;

    Mock::given(method("GET"))
        .and(path("/v1/client/nonce"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nonce": "n-42"})))
        .mount(&server)
        .await;

    let env = Env::new(Some(&server));
    let stdout = env.run_success(&["nonce"]).await;
    assert_eq!(stdout.trim(), "n-42");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fingerprint_is_stable() {
    let env = Env::new(None);

    let first = env.run_success(&["fingerprint"]).await;
    let second = env.run_success(&["fingerprint"]).await;

    assert!(!first.trim().is_empty());
    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_verbose_logs_store_path() {
    let env = Env::new(None);
    let output = env.run(&["fingerprint", "-vv"]).await;
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Using credential store"));
    assert!(stderr.contains(env.store().to_str().unwrap()));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_nonce_unavailable_is_logged() {
    let server = MockServer::start().await;
    mount_session(&server, "a1").await;

    Mock::given(method("GET"))
        .and(path("/v1/client/nonce"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let env = Env::new(Some(&server));
    let stderr = env.run_failure(&["nonce"]).await;
    assert!(stderr.contains("no usable nonce"));
    assert!(stderr.contains("Failed to obtain nonce"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_api_url() {
    let env = Env::new(None);
    let stderr = env.run_failure(&["session", "start"]).await;
    assert!(stderr.contains("LEADR_API_URL"));
}
