//! Deckhand core configuration
//!
//! プロジェクト設定 (deckhand.yaml) のモデル・読み込み・編集機能を提供します。
//! ビルド/デプロイの実行系は deckhand-build / deckhand-deploy が担当します。

pub mod configure;
pub mod error;
pub mod loader;
pub mod model;

pub use error::{ConfigError, Result};
pub use loader::{find_config_file, load_config, save_config};
pub use model::{
    BuildConfig, Config, DeploymentConfig, HelmConfig, ImageConfig, ManifestConfig,
    PortForwardConfig, SyncConfig,
};
