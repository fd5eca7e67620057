//! Provider map load/save
//!
//! The file is a YAML mapping of provider name to `{host, token}`.
//! The reserved default provider is special: its host is a fixed
//! constant, synthesized on load when the entry is absent and stripped
//! on save regardless of the in-memory value.

use crate::error::{ProviderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the reserved default provider
pub const DEFAULT_PROVIDER_NAME: &str = "deckhand-cloud";

/// Fixed host of the reserved default provider, never persisted
pub const DEFAULT_PROVIDER_HOST: &str = "https://cloud.deckhand.dev";

/// Relative path of the provider file under the home directory
const PROVIDER_CONFIG_PATH: &str = ".deckhand/providers.yaml";

/// A single provider entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Provider name, mirrors the map key (never serialized)
    #[serde(skip)]
    pub name: String,

    /// Endpoint host; None for the reserved provider on disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Access token obtained from a login
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
}

/// All configured providers, keyed by name
pub type ProviderConfig = BTreeMap<String, Provider>;

/// The default provider value, constructed once at startup and passed
/// into [`ProviderStore`] explicitly.
pub fn default_provider() -> Provider {
    Provider {
        name: DEFAULT_PROVIDER_NAME.to_string(),
        host: Some(DEFAULT_PROVIDER_HOST.to_string()),
        token: String::new(),
    }
}

/// Reads and writes the persisted provider map
pub struct ProviderStore {
    path: PathBuf,
    default_provider: Provider,
}

impl ProviderStore {
    /// Store at the default location (`~/.deckhand/providers.yaml`)
    pub fn new(default_provider: Provider) -> Result<Self> {
        let home = dirs::home_dir().ok_or(ProviderError::HomeDirNotFound)?;
        Ok(Self {
            path: home.join(PROVIDER_CONFIG_PATH),
            default_provider,
        })
    }

    /// Store at an explicit path
    pub fn with_path(path: impl Into<PathBuf>, default_provider: Provider) -> Self {
        Self {
            path: path.into(),
            default_provider,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the provider map
    ///
    /// A missing file yields a map containing only the reserved
    /// provider. The reserved provider's host is always replaced with
    /// the fixed constant, and the entry is synthesized when absent.
    pub fn load(&self) -> Result<ProviderConfig> {
        let mut config: ProviderConfig = match std::fs::read_to_string(&self.path) {
            Ok(content) => serde_yaml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Provider config not found at {}", self.path.display());
                ProviderConfig::new()
            }
            Err(e) => return Err(ProviderError::Io(e)),
        };

        match config.get_mut(&self.default_provider.name) {
            Some(reserved) => {
                reserved.host = self.default_provider.host.clone();
            }
            None => {
                config.insert(
                    self.default_provider.name.clone(),
                    self.default_provider.clone(),
                );
            }
        }

        for (name, provider) in config.iter_mut() {
            provider.name = name.clone();
        }

        Ok(config)
    }

    /// Save the provider map
    ///
    /// The reserved provider's host is stripped before writing,
    /// regardless of its in-memory value.
    pub fn save(&self, config: &ProviderConfig) -> Result<()> {
        let mut to_save = ProviderConfig::new();
        for (name, provider) in config {
            let host = if name == &self.default_provider.name {
                None
            } else {
                provider.host.clone()
            };
            to_save.insert(
                name.clone(),
                Provider {
                    name: String::new(),
                    host,
                    token: provider.token.clone(),
                },
            );
        }

        let content = serde_yaml::to_string(&to_save)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content)?;

        // トークンを含むため所有者のみ読み書き可能にする
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn store_at(dir: &Path) -> ProviderStore {
        ProviderStore::with_path(dir.join("providers.yaml"), default_provider())
    }

    #[test]
    fn test_load_missing_file_synthesizes_reserved_provider() {
        let temp_dir = tempdir().unwrap();
        let store = store_at(temp_dir.path());

        let config = store.load().unwrap();

        assert_eq!(config.len(), 1);
        let reserved = config.get(DEFAULT_PROVIDER_NAME).unwrap();
        assert_eq!(reserved.host.as_deref(), Some(DEFAULT_PROVIDER_HOST));
        assert!(reserved.token.is_empty());
    }

    #[test]
    fn test_load_synthesizes_reserved_when_absent_from_file() {
        let temp_dir = tempdir().unwrap();
        let store = store_at(temp_dir.path());
        fs::write(
            store.path(),
            "my-company:\n  host: https://deckhand.example.com\n  token: abc\n",
        )
        .unwrap();

        let config = store.load().unwrap();

        assert_eq!(config.len(), 2);
        let reserved = config.get(DEFAULT_PROVIDER_NAME).unwrap();
        assert_eq!(reserved.host.as_deref(), Some(DEFAULT_PROVIDER_HOST));
        assert!(reserved.token.is_empty());

        let company = config.get("my-company").unwrap();
        assert_eq!(company.host.as_deref(), Some("https://deckhand.example.com"));
        assert_eq!(company.token, "abc");
        assert_eq!(company.name, "my-company");
    }

    #[test]
    fn test_load_overrides_persisted_reserved_host() {
        // ファイルに書かれたhostは無視され、固定値で上書きされる
        let temp_dir = tempdir().unwrap();
        let store = store_at(temp_dir.path());
        fs::write(
            store.path(),
            format!(
                "{}:\n  host: https://evil.example.com\n  token: tok\n",
                DEFAULT_PROVIDER_NAME
            ),
        )
        .unwrap();

        let config = store.load().unwrap();
        let reserved = config.get(DEFAULT_PROVIDER_NAME).unwrap();
        assert_eq!(reserved.host.as_deref(), Some(DEFAULT_PROVIDER_HOST));
        assert_eq!(reserved.token, "tok");
    }

    #[test]
    fn test_save_strips_reserved_host() {
        let temp_dir = tempdir().unwrap();
        let store = store_at(temp_dir.path());

        let mut config = store.load().unwrap();
        config.get_mut(DEFAULT_PROVIDER_NAME).unwrap().token = "tok-1".to_string();
        store.save(&config).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert!(!content.contains(DEFAULT_PROVIDER_HOST));
        assert!(!content.contains("host"), "reserved host persisted: {}", content);
        assert!(content.contains("tok-1"));
    }

    #[test]
    fn test_save_keeps_other_provider_hosts() {
        let temp_dir = tempdir().unwrap();
        let store = store_at(temp_dir.path());

        let mut config = store.load().unwrap();
        config.insert(
            "my-company".to_string(),
            Provider {
                name: "my-company".to_string(),
                host: Some("https://deckhand.example.com".to_string()),
                token: "abc".to_string(),
            },
        );
        store.save(&config).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(
            reloaded.get("my-company").unwrap().host.as_deref(),
            Some("https://deckhand.example.com")
        );
    }

    #[test]
    fn test_save_load_round_trip_tokens() {
        let temp_dir = tempdir().unwrap();
        let store = store_at(temp_dir.path());

        let mut config = store.load().unwrap();
        config.get_mut(DEFAULT_PROVIDER_NAME).unwrap().token = "round".to_string();
        store.save(&config).unwrap();

        let reloaded = store.load().unwrap();
        let reserved = reloaded.get(DEFAULT_PROVIDER_NAME).unwrap();
        assert_eq!(reserved.token, "round");
        // hostは保存されないが、ロード時に固定値へ再導出される
        assert_eq!(reserved.host.as_deref(), Some(DEFAULT_PROVIDER_HOST));
    }
}
