//! レジストリ認証情報の解決
//!
//! 解決は三段階の優先順位で行われます:
//! 認証情報ストア → 明示的なユーザー名/パスワード → 公式レジストリ既定。
//! ストア参照の失敗でエラーにはならず、空の認証情報へ縮退します。

use crate::auth::{AuthConfig, RegistryAuth};
use crate::error::BuildResult;
use crate::reference::{DEFAULT_INDEX_SERVER, ImageReference};
use bollard::Docker;

/// 認証対象サーバーの決定と認証情報の解決
pub struct CredentialResolver {
    docker: Docker,
    store: RegistryAuth,
}

impl CredentialResolver {
    pub fn new(docker: Docker) -> Self {
        Self {
            docker,
            store: RegistryAuth::new(),
        }
    }

    /// 認証情報ストアを指定して作成（テスト用）
    pub fn with_store(docker: Docker, store: RegistryAuth) -> Self {
        Self { docker, store }
    }

    /// デーモンが報告する公式インデックスサーバーを取得
    ///
    /// `/info` が失敗した場合は警告を出して既定値を使います
    /// （docker CLIのelect-auth-serverと同じ振る舞い）。
    pub async fn official_server(&self) -> String {
        match self.docker.info().await {
            Ok(info) => info
                .index_server_address
                .filter(|address| !address.is_empty())
                .unwrap_or_else(|| DEFAULT_INDEX_SERVER.to_string()),
            Err(e) => {
                tracing::warn!(
                    "Failed to query daemon registry metadata, using default index: {}",
                    e
                );
                DEFAULT_INDEX_SERVER.to_string()
            }
        }
    }

    /// 認証情報を解決
    ///
    /// 1. 公式サーバーをデーモンに一度だけ問い合わせる
    /// 2. 対象が空なら公式サーバーを対象にする
    /// 3. 参照をパースして公式インデックスに解決されるなら対象を公式
    ///    サーバーへ補正する（パース失敗は伝播: fail-closed）
    /// 4. ストア参照が許可されていれば利用可能な認証情報を探す
    /// 5. 見つからなければ空の認証情報を返し、呼び出し側が明示的な
    ///    ユーザー名/パスワードで埋める
    pub async fn resolve(
        &self,
        registry_url: Option<&str>,
        image_url: &str,
        allow_credential_store: bool,
    ) -> BuildResult<AuthConfig> {
        let official = self.official_server().await;
        let server = elect_auth_server(&official, registry_url, image_url)?;

        if allow_credential_store {
            match self.store.get_credentials(&server) {
                Ok(Some(auth)) if auth.is_usable() => {
                    tracing::debug!("Using stored credentials for {}", server);
                    return Ok(auth);
                }
                Ok(_) => {}
                Err(e) => {
                    // ストアの不調では失敗させない
                    tracing::debug!("Credential store lookup failed for {}: {}", server, e);
                }
            }
        }

        Ok(AuthConfig::empty(server))
    }
}

/// 認証対象サーバーを決定する
///
/// レジストリ指定が無ければ公式サーバー。指定があっても参照が
/// 公式インデックスに解決される場合は公式サーバーへ補正します。
pub fn elect_auth_server(
    official: &str,
    registry_url: Option<&str>,
    image_url: &str,
) -> BuildResult<String> {
    match registry_url {
        None | Some("") => Ok(official.to_string()),
        Some(registry) => {
            let reference = ImageReference::parse(image_url)?;
            if reference.resolves_to_official_index(official) {
                Ok(official.to_string())
            } else {
                Ok(registry.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;

    const OFFICIAL: &str = "https://index.docker.io/v1/";

    #[test]
    fn test_empty_target_elects_official() {
        let server = elect_auth_server(OFFICIAL, None, "myuser/app").unwrap();
        assert_eq!(server, OFFICIAL);

        let server = elect_auth_server(OFFICIAL, Some(""), "myuser/app").unwrap();
        assert_eq!(server, OFFICIAL);
    }

    #[test]
    fn test_non_official_target_kept() {
        let server =
            elect_auth_server(OFFICIAL, Some("ghcr.io"), "ghcr.io/org/app:v1").unwrap();
        assert_eq!(server, "ghcr.io");
    }

    #[test]
    fn test_official_reference_overrides_target() {
        // レジストリ指定があっても参照が公式インデックスなら公式サーバーへ補正
        let server =
            elect_auth_server(OFFICIAL, Some("docker.io"), "docker.io/myuser/app").unwrap();
        assert_eq!(server, OFFICIAL);
    }

    #[test]
    fn test_malformed_reference_fails_closed() {
        let result = elect_auth_server(OFFICIAL, Some("ghcr.io"), "bad image!:");
        assert!(matches!(result, Err(BuildError::InvalidReference { .. })));
    }

    #[tokio::test]
    async fn test_resolve_store_miss_returns_empty() {
        // ストア参照に失敗しても例外は伝播せず、空の認証情報が返る
        let Ok(docker) = Docker::connect_with_local_defaults() else {
            return;
        };
        let temp_dir = tempfile::tempdir().unwrap();
        let store = RegistryAuth::with_config_path(temp_dir.path().join("missing.json"));
        let resolver = CredentialResolver::with_store(docker, store);

        let auth = resolver.resolve(None, "myuser/app", true).await.unwrap();
        assert!(!auth.is_usable());
        assert!(!auth.server_address.is_empty());
    }
}
