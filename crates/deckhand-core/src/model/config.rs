//! プロジェクト設定のルート

use super::deployment::DeploymentConfig;
use super::image::ImageConfig;
use super::port::PortForwardConfig;
use super::sync::SyncConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Config - プロジェクト設定の設計図
///
/// ビルド対象のイメージと、クラスタへ配置するデプロイメントを定義します。
/// YAML形式：
/// ```yaml
/// name: my-app
/// registry: ghcr.io/chronista-club
/// images:
///   app:
///     image: chronista-club/my-app
///     build:
///       dockerfile: ./Dockerfile
/// deployments:
///   - name: my-app
///     helm:
///       chart: ./chart
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// プロジェクト名
    pub name: String,
    /// デフォルトのコンテナレジストリURL（例: ghcr.io/owner）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    /// ビルド対象のイメージ定義
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub images: BTreeMap<String, ImageConfig>,
    /// クラスタへ配置するデプロイメント（宣言順に処理される）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deployments: Vec<DeploymentConfig>,
    /// ファイル同期設定
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sync: Vec<SyncConfig>,
    /// ポートフォワード設定
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortForwardConfig>,
}

impl Config {
    /// 名前でデプロイメントを取得
    pub fn deployment(&self, name: &str) -> Option<&DeploymentConfig> {
        self.deployments.iter().find(|d| d.name == name)
    }
}
