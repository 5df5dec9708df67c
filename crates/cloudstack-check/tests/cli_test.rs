#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BIN: &str = "cloudstack-check";
const ENV_VARS: [&str; 3] = [
    "CLOUDSTACK_API_URL",
    "CLOUDSTACK_API_KEY",
    "CLOUDSTACK_SECRET_KEY",
];

fn command_for(api_url: &str) -> Command {
    let mut cmd = Command::cargo_bin(BIN).unwrap();
    cmd.env("CLOUDSTACK_API_URL", api_url)
        .env("CLOUDSTACK_API_KEY", "test-key")
        .env("CLOUDSTACK_SECRET_KEY", "test-secret")
        .env_remove("CLOUDSTACK_HTTP_GET_ONLY")
        .env_remove("CLOUDSTACK_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn accounts_body(names: &[&str]) -> serde_json::Value {
    let accounts: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, name)| serde_json::json!({"id": format!("a{}", i), "name": name}))
        .collect();
    serde_json::json!({
        "listaccountsresponse": {"count": accounts.len(), "account": accounts}
    })
}

fn users_body(names: &[&str]) -> serde_json::Value {
    let users: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            serde_json::json!({"id": format!("u{}", i), "username": name, "account": "admin"})
        })
        .collect();
    serde_json::json!({
        "listusersresponse": {"count": users.len(), "user": users}
    })
}

/// 環境変数が一つもない場合は3つすべての名前を含むエラーで終了する
#[test]
fn test_missing_all_env_vars() {
    let mut cmd = Command::cargo_bin(BIN).unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }

    let mut assert = cmd.assert().failure().stdout(predicate::str::is_empty());
    for var in ENV_VARS {
        assert = assert.stderr(predicate::str::contains(var));
    }
}

/// 一部だけ欠けている場合は欠けている名前だけを挙げる
#[test]
fn test_missing_secret_only() {
    let mut cmd = Command::cargo_bin(BIN).unwrap();
    cmd.env("CLOUDSTACK_API_URL", "http://127.0.0.1:9/client/api")
        .env("CLOUDSTACK_API_KEY", "k")
        .env_remove("CLOUDSTACK_SECRET_KEY")
        .assert()
        .failure()
        .stderr(predicate::str::contains("CLOUDSTACK_SECRET_KEY"))
        .stderr(predicate::str::contains("CLOUDSTACK_API_KEY").not());
}

/// N件のアカウントとM件のユーザーを返却順にそのまま出力する
#[tokio::test(flavor = "multi_thread")]
async fn test_lists_accounts_then_users_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/client/api"))
        .and(body_string_contains("command=listAccounts"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(accounts_body(&["zeta", "admin", "ops"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/client/api"))
        .and(body_string_contains("command=listUsers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users_body(&["carol", "bob"])))
        .expect(1)
        .mount(&server)
        .await;

    let api_url = format!("{}/client/api", server.uri());
    let output = tokio::task::spawn_blocking(move || command_for(&api_url).output().unwrap())
        .await
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Account: zeta (ID: a0)",
            "Account: admin (ID: a1)",
            "Account: ops (ID: a2)",
            "User: carol (ID: u0, Account: admin)",
            "User: bob (ID: u1, Account: admin)",
        ]
    );
}

/// アカウント取得が失敗した場合、ユーザー取得は実行されない
#[tokio::test(flavor = "multi_thread")]
async fn test_account_failure_skips_users() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/client/api"))
        .and(body_string_contains("command=listAccounts"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "listaccountsresponse": {
                "errorcode": 401,
                "errortext": "unable to verify user credentials and/or request signature"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/client/api"))
        .and(body_string_contains("command=listUsers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users_body(&["bob"])))
        .expect(0)
        .mount(&server)
        .await;

    let api_url = format!("{}/client/api", server.uri());
    let output = tokio::task::spawn_blocking(move || command_for(&api_url).output().unwrap())
        .await
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("listAccounts failed"), "{stderr}");
    assert!(stderr.contains("unable to verify user credentials"), "{stderr}");

    server.verify().await;
}

/// CLOUDSTACK_HTTP_GET_ONLY=true なら GET で問い合わせ、JSON 形式でも出力できる
#[tokio::test(flavor = "multi_thread")]
async fn test_get_only_json_output() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/client/api"))
        .and(query_param("command", "listAccounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(accounts_body(&["admin"])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/client/api"))
        .and(query_param("command", "listUsers"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"listusersresponse": {}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api_url = format!("{}/client/api", server.uri());
    let output = tokio::task::spawn_blocking(move || {
        command_for(&api_url)
            .env("CLOUDSTACK_HTTP_GET_ONLY", "true")
            .args(["--output", "json"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["name"], "admin");
}

/// ヘルプに --output が表示されることを確認
#[test]
fn test_help() {
    let mut cmd = Command::cargo_bin(BIN).unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output"));
}
