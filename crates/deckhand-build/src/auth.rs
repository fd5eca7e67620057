//! レジストリ認証情報
//!
//! Docker config.json と credential helper から認証情報を取得し、
//! AuthConfig に変換します。取得失敗は常に「認証情報なし」へ縮退し、
//! 呼び出し側が明示的な入力へフォールバックできるようにします。

use crate::error::{BuildError, BuildResult};
use base64::Engine;
use bollard::auth::DockerCredentials;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// credential helper がidentity tokenを返すときのユーザー名
pub const TOKEN_USERNAME: &str = "<token>";

/// レジストリ認証情報
///
/// 不変条件: identity_token が空でないとき password は空。
/// ログイン交換でトークンを得た時点でパスワードは破棄されます。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    pub identity_token: String,
    pub server_address: String,
}

impl AuthConfig {
    /// 指定サーバー向けの空の認証情報
    pub fn empty(server_address: impl Into<String>) -> Self {
        Self {
            server_address: server_address.into(),
            ..Default::default()
        }
    }

    /// identity tokenを採用し、パスワードを破棄する
    pub fn adopt_identity_token(&mut self, token: impl Into<String>) {
        self.identity_token = token.into();
        self.password.clear();
    }

    pub fn has_user_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    pub fn has_identity_token(&self) -> bool {
        !self.identity_token.is_empty()
    }

    /// プッシュに使える認証情報を持っているか
    pub fn is_usable(&self) -> bool {
        self.has_user_credentials() || self.has_identity_token()
    }

    /// Bollardのプッシュ/プル用認証情報へ変換
    pub fn to_docker_credentials(&self) -> DockerCredentials {
        DockerCredentials {
            username: if self.username.is_empty() {
                None
            } else {
                Some(self.username.clone())
            },
            password: if self.password.is_empty() {
                None
            } else {
                Some(self.password.clone())
            },
            identitytoken: if self.identity_token.is_empty() {
                None
            } else {
                Some(self.identity_token.clone())
            },
            serveraddress: Some(self.server_address.clone()),
            ..Default::default()
        }
    }
}

/// Docker config.json の構造
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DockerConfig {
    /// 認証情報 (レジストリ -> AuthEntry)
    #[serde(default)]
    auths: HashMap<String, AuthEntry>,
    /// credential helper 名 (例: "osxkeychain", "desktop")
    #[serde(default)]
    creds_store: Option<String>,
}

/// 認証エントリ
#[derive(Debug, Deserialize)]
struct AuthEntry {
    /// Base64エンコードされた "username:password"
    auth: Option<String>,
    /// ログイン交換で発行されたidentity token
    #[serde(default)]
    identitytoken: Option<String>,
}

/// credential helper からのレスポンス
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CredentialResponse {
    username: String,
    secret: String,
}

/// 認証情報ストアへのアクセス
#[derive(Debug)]
pub struct RegistryAuth {
    config_path: PathBuf,
}

impl Default for RegistryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryAuth {
    /// 新しい RegistryAuth を作成
    ///
    /// デフォルトで ~/.docker/config.json を使用
    pub fn new() -> Self {
        let config_path = std::env::var("DOCKER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|h| h.join(".docker"))
                    .unwrap_or_else(|| PathBuf::from(".docker"))
            })
            .join("config.json");

        Self { config_path }
    }

    /// 指定したパスの config.json を使用
    pub fn with_config_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// レジストリサーバーの認証情報を取得
    ///
    /// # Returns
    /// * `Ok(Some(auth))` - 認証情報が見つかった場合
    /// * `Ok(None)` - 認証情報が不要または見つからない場合
    /// * `Err(e)` - config.json が壊れている場合
    pub fn get_credentials(&self, server: &str) -> BuildResult<Option<AuthConfig>> {
        // config.json が存在しない場合は認証なしで続行
        if !self.config_path.exists() {
            tracing::debug!("Docker config.json not found at {:?}", self.config_path);
            return Ok(None);
        }

        let config = self.load_docker_config()?;

        // 1. auths セクションを確認
        if let Some(entry) = config.auths.get(server)
            && let Some(auth) = self.decode_entry(entry, server)?
        {
            tracing::debug!("Found credentials in auths for {}", server);
            return Ok(Some(auth));
        }

        // 2. credential helper を確認
        if let Some(helper) = &config.creds_store {
            tracing::debug!("Trying credential helper: {}", helper);
            if let Ok(Some(auth)) = self.get_from_helper(helper, server) {
                return Ok(Some(auth));
            }
        }

        tracing::debug!("No credentials found for {}", server);
        Ok(None)
    }

    /// config.json にある全レジストリの認証情報を取得
    ///
    /// マルチステージビルドがプライベートなベースイメージを参照できるよう、
    /// ビルドリクエストに添付されます。取得できないエントリは読み飛ばします。
    pub fn all_credentials(&self) -> HashMap<String, DockerCredentials> {
        let mut credentials = HashMap::new();

        if !self.config_path.exists() {
            return credentials;
        }

        let config = match self.load_docker_config() {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Failed to load docker config: {}", e);
                return credentials;
            }
        };

        for (server, entry) in &config.auths {
            match self.decode_entry(entry, server) {
                Ok(Some(auth)) => {
                    credentials.insert(server.clone(), auth.to_docker_credentials());
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!("Skipping auth entry for {}: {}", server, e);
                }
            }
        }

        credentials
    }

    /// Docker config.json を読み込み
    fn load_docker_config(&self) -> BuildResult<DockerConfig> {
        let content =
            std::fs::read_to_string(&self.config_path).map_err(|e| BuildError::AuthFailed {
                registry: self.config_path.display().to_string(),
                message: format!("Failed to read config.json: {}", e),
            })?;

        serde_json::from_str(&content).map_err(|e| BuildError::AuthFailed {
            registry: self.config_path.display().to_string(),
            message: format!("Failed to parse config.json: {}", e),
        })
    }

    /// auths エントリを AuthConfig へ変換
    fn decode_entry(&self, entry: &AuthEntry, server: &str) -> BuildResult<Option<AuthConfig>> {
        let mut auth = match &entry.auth {
            Some(auth_b64) => match self.decode_auth(auth_b64, server)? {
                Some(auth) => auth,
                None => return Ok(None),
            },
            None => AuthConfig::empty(server),
        };

        // identity tokenがあればパスワードより優先
        if let Some(token) = &entry.identitytoken
            && !token.is_empty()
        {
            auth.adopt_identity_token(token.clone());
        }

        if auth.is_usable() { Ok(Some(auth)) } else { Ok(None) }
    }

    /// Base64エンコードされた認証情報をデコード
    fn decode_auth(&self, auth_b64: &str, server: &str) -> BuildResult<Option<AuthConfig>> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(auth_b64)
            .map_err(|e| BuildError::AuthFailed {
                registry: server.to_string(),
                message: format!("Failed to decode auth: {}", e),
            })?;

        let auth_str = String::from_utf8(decoded).map_err(|e| BuildError::AuthFailed {
            registry: server.to_string(),
            message: format!("Invalid UTF-8 in auth: {}", e),
        })?;

        if let Some((username, password)) = auth_str.split_once(':') {
            Ok(Some(AuthConfig {
                username: username.to_string(),
                password: password.to_string(),
                identity_token: String::new(),
                server_address: server.to_string(),
            }))
        } else {
            Ok(None)
        }
    }

    /// credential helper から認証情報を取得
    fn get_from_helper(&self, helper: &str, server: &str) -> BuildResult<Option<AuthConfig>> {
        let helper_cmd = format!("docker-credential-{}", helper);

        let mut child = Command::new(&helper_cmd)
            .arg("get")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BuildError::AuthFailed {
                registry: server.to_string(),
                message: format!("Failed to run {}: {}", helper_cmd, e),
            })?;

        // レジストリ名を stdin に渡す
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(server.as_bytes()).ok();
        }

        let output = child
            .wait_with_output()
            .map_err(|e| BuildError::AuthFailed {
                registry: server.to_string(),
                message: format!("Credential helper failed: {}", e),
            })?;

        if !output.status.success() {
            // credential helper が認証情報を持っていない場合は None を返す
            tracing::debug!(
                "Credential helper returned error for {}: {}",
                server,
                String::from_utf8_lossy(&output.stderr)
            );
            return Ok(None);
        }

        let response: CredentialResponse =
            serde_json::from_slice(&output.stdout).map_err(|e| BuildError::AuthFailed {
                registry: server.to_string(),
                message: format!("Failed to parse credential helper response: {}", e),
            })?;

        // ユーザー名が <token> の場合、secretはidentity token
        let mut auth = AuthConfig::empty(server);
        if response.username == TOKEN_USERNAME {
            auth.adopt_identity_token(response.secret);
        } else {
            auth.username = response.username;
            auth.password = response.secret;
        }

        Ok(Some(auth))
    }
}
