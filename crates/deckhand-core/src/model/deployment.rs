//! デプロイメント定義

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// デプロイメント定義
///
/// `helm` と `manifests` はどちらか一方のみ指定できます。
/// `manifests` が指定されていればマニフェスト適用エンジン、
/// 無ければリリースエンジン（Helm）が選択されます。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// デプロイメント名（リリース名のデフォルトにもなる）
    pub name: String,
    /// リリースエンジン（Helm）の設定
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm: Option<HelmConfig>,
    /// マニフェスト適用エンジン（kubectl）の設定
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifests: Option<ManifestConfig>,
}

/// Helmリリース設定
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelmConfig {
    /// チャートのパス（プロジェクトルートからの相対パス）
    pub chart: PathBuf,
    /// リリース名（未指定の場合はデプロイメント名）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    /// valuesファイルのパス
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<PathBuf>,
    /// チャートに追加するパッケージ（chart dependencies）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<String>,
}

/// kubectlマニフェスト設定
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// 適用するマニフェストのパス（ファイルまたはディレクトリ）
    pub paths: Vec<PathBuf>,
}
