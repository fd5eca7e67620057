use crate::utils;
use colored::Colorize;
use deckhand_deploy::{ClusterHandle, create_backend};
use deckhand_core::Config;
use std::path::Path;

/// statusコマンドを処理
///
/// デプロイメントごとに状態を取得して表示します。
/// 取得できないデプロイメントも結果に含めます。
pub async fn handle(
    config: &Config,
    config_path: &Path,
    project_root: &Path,
    cluster: &ClusterHandle,
) -> anyhow::Result<()> {
    println!("{}", "デプロイメントの状態を取得中...".blue());
    utils::print_loaded_config(config_path);

    if config.deployments.is_empty() {
        println!("{}", "デプロイメントが設定されていません".yellow());
        return Ok(());
    }

    println!();
    for deployment in &config.deployments {
        let backend = match create_backend(cluster, deployment, project_root) {
            Ok(backend) => backend,
            Err(e) => {
                println!(
                    "  {} {}: バックエンド構築エラー ({})",
                    "⚠".yellow(),
                    deployment.name,
                    e
                );
                continue;
            }
        };

        match backend.status().await {
            Ok(status) => {
                let mark = if status.ready {
                    "✓".green()
                } else {
                    "✗".red()
                };
                println!(
                    "  {} {} [{}] {}",
                    mark,
                    status.name.cyan(),
                    status.engine,
                    status.detail.dimmed()
                );
            }
            Err(e) => {
                println!(
                    "  {} {}: 状態取得エラー ({})",
                    "⚠".yellow(),
                    deployment.name,
                    e
                );
            }
        }
    }

    Ok(())
}
