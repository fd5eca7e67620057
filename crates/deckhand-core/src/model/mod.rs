//! 設定モデル

mod config;
mod deployment;
mod image;
mod port;
mod sync;

pub use config::Config;
pub use deployment::{DeploymentConfig, HelmConfig, ManifestConfig};
pub use image::{BuildConfig, ImageConfig};
pub use port::PortForwardConfig;
pub use sync::SyncConfig;
