//! 設定エントリの削除操作
//!
//! `deckhand remove {sync|port|package|deployment}` の実体。
//! いずれも Config を編集して削除件数を返すだけで、保存は呼び出し側が行います。

use crate::error::{ConfigError, Result};
use crate::model::Config;

/// デプロイメントを削除
///
/// `all` で全件、それ以外は名前指定。
pub fn remove_deployment(config: &mut Config, all: bool, name: Option<&str>) -> Result<usize> {
    if all {
        let removed = config.deployments.len();
        config.deployments.clear();
        return Ok(removed);
    }

    let name = name.ok_or(ConfigError::NoRemoveTarget)?;
    let before = config.deployments.len();
    config.deployments.retain(|d| d.name != name);

    let removed = before - config.deployments.len();
    if removed == 0 {
        return Err(ConfigError::DeploymentNotFound(name.to_string()));
    }
    Ok(removed)
}

/// 同期パスを削除
///
/// `all` で全件。それ以外はローカルパス・コンテナパス・セレクタの
/// いずれかが一致するエントリを削除します。
pub fn remove_sync(
    config: &mut Config,
    all: bool,
    local_path: Option<&str>,
    container_path: Option<&str>,
    selector: Option<&str>,
) -> Result<usize> {
    if all {
        let removed = config.sync.len();
        config.sync.clear();
        return Ok(removed);
    }

    if local_path.is_none() && container_path.is_none() && selector.is_none() {
        return Err(ConfigError::NoRemoveTarget);
    }

    let before = config.sync.len();
    config.sync.retain(|s| {
        let matches = local_path.is_some_and(|p| s.local_path == p)
            || container_path.is_some_and(|p| s.container_path == p)
            || selector.is_some_and(|sel| s.matches_selector(sel));
        !matches
    });

    Ok(before - config.sync.len())
}

/// ポートフォワードを削除
///
/// `all` で全件。それ以外はセレクタ一致、またはポート番号リストの
/// いずれかを含むエントリを削除します。
pub fn remove_port(
    config: &mut Config,
    all: bool,
    selector: Option<&str>,
    ports: &[u16],
) -> Result<usize> {
    if all {
        let removed = config.ports.len();
        config.ports.clear();
        return Ok(removed);
    }

    if selector.is_none() && ports.is_empty() {
        return Err(ConfigError::NoRemoveTarget);
    }

    let before = config.ports.len();
    config.ports.retain(|p| {
        let matches =
            selector.is_some_and(|sel| p.matches_selector(sel)) || p.contains_any(ports);
        !matches
    });

    Ok(before - config.ports.len())
}

/// Helmデプロイメントからパッケージを削除
///
/// `deployment` 未指定の場合、Helmデプロイメントが1つだけならそれを対象にします。
pub fn remove_package(
    config: &mut Config,
    all: bool,
    deployment: Option<&str>,
    package: Option<&str>,
) -> Result<usize> {
    let target = match deployment {
        Some(name) => config
            .deployments
            .iter_mut()
            .find(|d| d.name == name)
            .ok_or_else(|| ConfigError::DeploymentNotFound(name.to_string()))?,
        None => {
            let mut helm_deployments: Vec<_> = config
                .deployments
                .iter_mut()
                .filter(|d| d.helm.is_some())
                .collect();
            if helm_deployments.len() != 1 {
                return Err(ConfigError::InvalidConfig(
                    "対象のデプロイメントを -d で指定してください".to_string(),
                ));
            }
            helm_deployments.remove(0)
        }
    };

    let helm = target.helm.as_mut().ok_or_else(|| {
        ConfigError::InvalidConfig(format!(
            "デプロイメント '{}' はHelmデプロイメントではありません",
            target.name
        ))
    })?;

    if all {
        let removed = helm.packages.len();
        helm.packages.clear();
        return Ok(removed);
    }

    let package = package.ok_or(ConfigError::NoRemoveTarget)?;
    let before = helm.packages.len();
    helm.packages.retain(|p| p != package);
    Ok(before - helm.packages.len())
}

/// "8080,3000" 形式のポートリストをパース
pub fn parse_port_list(input: &str) -> Result<Vec<u16>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u16>()
                .map_err(|_| ConfigError::InvalidConfig(format!("無効なポート番号: {}", s)))
        })
        .collect()
}
