//! removeコマンドのend-to-endテスト
//!
//! 一時ディレクトリにdeckhand.yamlを用意し、実際のバイナリで
//! 設定エントリの削除と保存を確認します。

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const CONFIG: &str = r#"
name: demo
deployments:
  - name: app
    helm:
      chart: ./chart
      packages:
        - mysql
        - redis
  - name: extras
    manifests:
      paths:
        - kube/
sync:
  - selector: release=app
    local_path: ./src
    container_path: /app
ports:
  - selector: release=app
    ports:
      - 8080
      - 3000
"#;

struct TestProject {
    root: TempDir,
}

impl TestProject {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("deckhand.yaml"), CONFIG).unwrap();
        Self { root }
    }

    fn deckhand(&self) -> Command {
        let mut cmd = Command::cargo_bin("deckhand").unwrap();
        cmd.current_dir(self.root.path())
            .env_remove("DECKHAND_CONFIG_PATH");
        cmd
    }

    fn config_content(&self) -> String {
        fs::read_to_string(self.root.path().join("deckhand.yaml")).unwrap()
    }
}

#[test]
fn test_remove_deployment_by_name() {
    let project = TestProject::new();

    project
        .deckhand()
        .args(["remove", "deployment", "extras"])
        .assert()
        .success();

    let content = project.config_content();
    assert!(!content.contains("extras"));
    assert!(content.contains("app"));
}

#[test]
fn test_remove_deployment_all() {
    let project = TestProject::new();

    project
        .deckhand()
        .args(["remove", "deployment", "--all"])
        .assert()
        .success();

    let content = project.config_content();
    assert!(!content.contains("deployments:"));
}

#[test]
fn test_remove_deployment_requires_target() {
    let project = TestProject::new();

    project
        .deckhand()
        .args(["remove", "deployment"])
        .assert()
        .failure();
}

#[test]
fn test_remove_sync_by_local_path() {
    let project = TestProject::new();

    project
        .deckhand()
        .args(["remove", "sync", "--local", "./src"])
        .assert()
        .success();

    let content = project.config_content();
    assert!(!content.contains("local_path"));
}

#[test]
fn test_remove_port_by_number() {
    let project = TestProject::new();

    project
        .deckhand()
        .args(["remove", "port", "8080,3000"])
        .assert()
        .success();

    let content = project.config_content();
    assert!(!content.contains("8080"));
}

#[test]
fn test_remove_port_all() {
    let project = TestProject::new();

    project
        .deckhand()
        .args(["remove", "port", "--all"])
        .assert()
        .success();

    let content = project.config_content();
    assert!(!content.contains("ports:"));
}

#[test]
fn test_remove_package() {
    let project = TestProject::new();

    project
        .deckhand()
        .args(["remove", "package", "mysql", "-d", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1"));

    let content = project.config_content();
    assert!(!content.contains("mysql"));
    assert!(content.contains("redis"));
}

/// 構築に失敗するデプロイメントがあってもdownはバッチ全体を処理する
#[test]
fn test_down_reports_skipped_deployments() {
    let project = TestProject::new();
    // chartディレクトリもkube/も存在しないため、両方とも構築に失敗する

    project
        .deckhand()
        .args(["down"])
        .assert()
        .success()
        .stdout(predicate::str::contains("app"))
        .stdout(predicate::str::contains("extras"))
        .stdout(predicate::str::contains("スキップ"));
}
