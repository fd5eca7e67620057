use colored::Colorize;
use deckhand_core::{Config, configure};
use std::path::Path;

/// remove sync を処理
pub fn handle_sync(
    config: &mut Config,
    config_path: &Path,
    all: bool,
    local: Option<&str>,
    container: Option<&str>,
    selector: Option<&str>,
) -> anyhow::Result<()> {
    let removed = configure::remove_sync(config, all, local, container, selector)?;
    deckhand_core::save_config(config_path, config)?;
    print_result("同期パス", removed);
    Ok(())
}

/// remove port を処理
pub fn handle_port(
    config: &mut Config,
    config_path: &Path,
    all: bool,
    selector: Option<&str>,
    ports: Option<&str>,
) -> anyhow::Result<()> {
    let ports = match ports {
        Some(list) => configure::parse_port_list(list)?,
        None => Vec::new(),
    };
    let removed = configure::remove_port(config, all, selector, &ports)?;
    deckhand_core::save_config(config_path, config)?;
    print_result("ポートフォワード", removed);
    Ok(())
}

/// remove package を処理
pub fn handle_package(
    config: &mut Config,
    config_path: &Path,
    all: bool,
    deployment: Option<&str>,
    name: Option<&str>,
) -> anyhow::Result<()> {
    let removed = configure::remove_package(config, all, deployment, name)?;
    deckhand_core::save_config(config_path, config)?;
    print_result("パッケージ", removed);
    Ok(())
}

/// remove deployment を処理
pub fn handle_deployment(
    config: &mut Config,
    config_path: &Path,
    all: bool,
    name: Option<&str>,
) -> anyhow::Result<()> {
    let removed = configure::remove_deployment(config, all, name)?;
    deckhand_core::save_config(config_path, config)?;
    print_result("デプロイメント", removed);
    Ok(())
}

fn print_result(kind: &str, removed: usize) {
    if removed == 0 {
        println!("{}", format!("削除対象の{}はありません", kind).yellow());
    } else {
        println!(
            "{}",
            format!("✓ {}を {} 件削除しました", kind, removed).green()
        );
    }
}
