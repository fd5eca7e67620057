//! 設定ファイルの発見と読み込み

use crate::error::{ConfigError, Result};
use crate::model::Config;
use std::path::{Path, PathBuf};

/// プロジェクトの設定ファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 DECKHAND_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: deckhand.local.yaml, deckhand.yaml
/// 3. ./.deckhand/ ディレクトリ内: 同様の順序
pub fn find_config_file() -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var("DECKHAND_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;
    find_config_file_in(&current_dir)
}

/// 指定ディレクトリを起点に設定ファイルを探す
pub fn find_config_file_in(dir: &Path) -> Result<PathBuf> {
    let candidates = ["deckhand.local.yaml", "deckhand.yaml"];

    // カレントディレクトリで検索
    for filename in &candidates {
        let path = dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    // ./.deckhand/ ディレクトリで検索
    let deckhand_dir = dir.join(".deckhand");
    if deckhand_dir.is_dir() {
        for filename in &candidates {
            let path = deckhand_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// 設定ファイルを読み込み、検証する
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_yaml::from_str(&content)?;

    validate(&config)?;

    tracing::debug!(
        "Loaded config '{}' with {} images, {} deployments",
        config.name,
        config.images.len(),
        config.deployments.len()
    );

    Ok(config)
}

/// 設定を検証
///
/// デプロイメント名の重複と、helm/manifests の同時指定を拒否します。
fn validate(config: &Config) -> Result<()> {
    if config.name.is_empty() {
        return Err(ConfigError::InvalidConfig(
            "name が指定されていません".to_string(),
        ));
    }

    let mut seen = std::collections::BTreeSet::new();
    for deployment in &config.deployments {
        if deployment.name.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "名前のないデプロイメントがあります".to_string(),
            ));
        }
        if !seen.insert(&deployment.name) {
            return Err(ConfigError::InvalidConfig(format!(
                "デプロイメント名が重複しています: {}",
                deployment.name
            )));
        }
        if deployment.helm.is_some() && deployment.manifests.is_some() {
            return Err(ConfigError::AmbiguousDeployment(deployment.name.clone()));
        }
    }

    Ok(())
}

/// 設定をファイルに書き戻す
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let content = serde_yaml::to_string(config).map_err(|e| ConfigError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)?;
    tracing::debug!("Saved config to {}", path.display());
    Ok(())
}
