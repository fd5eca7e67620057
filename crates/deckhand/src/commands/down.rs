use crate::utils;
use colored::Colorize;
use deckhand_deploy::{ClusterHandle, TeardownOutcome, teardown_all};
use deckhand_core::Config;
use std::path::Path;

/// downコマンドを処理
///
/// すべてのデプロイメントを宣言順に削除します。個々の失敗は記録して
/// 続行し、最後にデプロイメントごとの結果を報告します。
pub async fn handle(
    config: &Config,
    config_path: &Path,
    project_root: &Path,
    cluster: &ClusterHandle,
) -> anyhow::Result<()> {
    println!("{}", "デプロイメントを削除中...".yellow());
    utils::print_loaded_config(config_path);

    if config.deployments.is_empty() {
        println!("{}", "デプロイメントが設定されていません".yellow());
        return Ok(());
    }

    println!();
    println!(
        "{}",
        format!("削除対象 ({} 個):", config.deployments.len()).bold()
    );
    for deployment in &config.deployments {
        println!("  • {}", deployment.name.cyan());
    }

    println!();
    let report = teardown_all(cluster, &config.deployments, project_root).await;

    // デプロイメントごとの結果
    println!();
    println!("{}", "結果サマリー:".bold());
    for outcome in &report.outcomes {
        match outcome {
            TeardownOutcome::Deleted { deployment } => {
                println!("  {} {}: 削除完了", "✓".green(), deployment);
            }
            TeardownOutcome::Skipped { deployment, error } => {
                println!(
                    "  {} {}: バックエンド構築エラーのためスキップ ({})",
                    "⚠".yellow(),
                    deployment,
                    error
                );
            }
            TeardownOutcome::DeleteFailed { deployment, error } => {
                println!("  {} {}: 削除エラー ({})", "⚠".yellow(), deployment, error);
            }
        }
    }

    println!();
    if report.is_clean() {
        println!(
            "{}",
            "✓ すべてのデプロイメントが削除されました！".green().bold()
        );
    } else {
        // 部分的な削除は許容される終端状態
        println!(
            "{}",
            "一部のデプロイメントは削除できませんでした。上記の結果を確認してください。"
                .yellow()
        );
    }

    Ok(())
}
