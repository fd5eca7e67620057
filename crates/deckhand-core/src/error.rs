use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("YAMLパースエラー: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "設定ファイルが見つかりません。以下の場所を確認してください:\n\
        - カレントディレクトリ: deckhand.local.yaml, deckhand.yaml\n\
        - ./.deckhand/ ディレクトリ\n\
        または DECKHAND_CONFIG_PATH 環境変数で直接指定できます"
    )]
    ConfigFileNotFound,

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error(
        "デプロイメント '{0}' に helm と manifests の両方が指定されています。\n\
        どちらか一方のみを指定してください"
    )]
    AmbiguousDeployment(String),

    #[error("デプロイメントが見つかりません: {0}")]
    DeploymentNotFound(String),

    #[error("イメージが見つかりません: {0}")]
    ImageNotFound(String),

    #[error("削除対象を指定してください（名前・セレクタ、または --all）")]
    NoRemoveTarget,

    #[error("設定ファイルの保存に失敗しました: {path}\n理由: {message}")]
    SaveError { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
