use crate::utils;
use colored::Colorize;
use deckhand_deploy::{ClusterHandle, create_backend};
use deckhand_core::Config;
use std::path::Path;

/// デプロイコマンドを処理
///
/// 各デプロイメントごとにバックエンドを選択して配置します。
/// バックエンドの構築に失敗したデプロイメントは警告を出して
/// スキップし、残りの処理を続けます。
pub async fn handle(
    config: &Config,
    config_path: &Path,
    project_root: &Path,
    cluster: &ClusterHandle,
    deployment_filter: Option<&str>,
) -> anyhow::Result<()> {
    println!("{}", "デプロイを開始します...".blue().bold());
    utils::print_loaded_config(config_path);

    let targets: Vec<_> = config
        .deployments
        .iter()
        .filter(|d| deployment_filter.is_none_or(|filter| filter == d.name))
        .collect();

    if let Some(filter) = deployment_filter
        && targets.is_empty()
    {
        return Err(anyhow::anyhow!(
            "デプロイメント '{}' が見つかりません",
            filter
        ));
    }

    if targets.is_empty() {
        println!("{}", "デプロイメントが設定されていません".yellow());
        return Ok(());
    }

    println!();
    println!(
        "{}",
        format!("デプロイ対象 ({} 個):", targets.len()).bold()
    );
    for deployment in &targets {
        let engine = if deployment.manifests.is_some() {
            "kubectl"
        } else {
            "helm"
        };
        println!("  • {} ({})", deployment.name.cyan(), engine);
    }

    let mut deployed = 0usize;
    for deployment in &targets {
        println!();
        println!(
            "{}",
            format!("■ {} を配置中...", deployment.name).green().bold()
        );

        // 構築失敗はこのデプロイメントだけの問題として続行する
        let backend = match create_backend(cluster, deployment, project_root) {
            Ok(backend) => backend,
            Err(e) => {
                println!("  {} バックエンド構築エラー: {}", "⚠".yellow(), e);
                continue;
            }
        };

        match backend.deploy().await {
            Ok(()) => {
                println!("  {} 配置完了", "✓".green());
                deployed += 1;
            }
            Err(e) => {
                eprintln!("  {} 配置エラー: {}", "✗".red().bold(), e);
                return Err(anyhow::anyhow!(
                    "デプロイメント '{}' の配置に失敗しました",
                    deployment.name
                ));
            }
        }
    }

    println!();
    println!(
        "{}",
        format!("✓ デプロイ完了 ({}/{} 個)", deployed, targets.len())
            .green()
            .bold()
    );

    Ok(())
}
