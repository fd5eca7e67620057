//! イメージ定義

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// ビルド対象のイメージ定義
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageConfig {
    /// リポジトリ名（例: chronista-club/my-app）
    pub image: String,
    /// イメージタグ（未指定の場合は latest）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// イメージ固有のレジストリURL（Config.registry を上書き）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    /// ビルド設定（未指定の場合はビルド対象外）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildConfig>,
    /// 認証情報ストアを参照するかどうか
    #[serde(default = "default_true")]
    pub use_credential_store: bool,
}

fn default_true() -> bool {
    true
}

/// ビルド設定
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Dockerfileのパス（プロジェクトルートからの相対パス）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<PathBuf>,
    /// ビルドコンテキストのパス
    /// 未指定の場合はプロジェクトルート
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<PathBuf>,
    /// ビルド引数
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, String>,
}

impl ImageConfig {
    /// タグを解決（デフォルト: latest）
    pub fn tag(&self) -> &str {
        self.tag.as_deref().unwrap_or("latest")
    }
}
