//! イメージプッシュ
//!
//! ビルドしたイメージをレジストリへプッシュします。プッシュは
//! `authenticate` が返す [`Authenticated`] を要求するため、
//! 認証前のプッシュは型レベルで起こりません。

use crate::auth::AuthConfig;
use crate::error::{BuildError, BuildResult};
use crate::progress::ProgressSink;
use crate::reference::ImageReference;
use crate::resolver::CredentialResolver;
use bollard::Docker;
use bollard::models::PushImageInfo;
use futures_util::StreamExt;

/// 認証済みであることの証明
///
/// `ImagePusher::authenticate` だけが生成できます。
/// プッシュの認証情報はこの値から取り出されます。
#[derive(Debug, Clone)]
pub struct Authenticated {
    auth: AuthConfig,
}

impl Authenticated {
    pub fn auth_config(&self) -> &AuthConfig {
        &self.auth
    }

    pub fn server_address(&self) -> &str {
        &self.auth.server_address
    }

    /// 認証済みの証明を取り出す
    ///
    /// 認証前にプッシュしようとした呼び出し側には
    /// [`BuildError::NotAuthenticated`] が返ります。
    pub fn require(auth: Option<&Authenticated>) -> BuildResult<&Authenticated> {
        auth.ok_or(BuildError::NotAuthenticated)
    }
}

/// イメージプッシュを実行するハンドラ
pub struct ImagePusher {
    docker: Docker,
    resolver: CredentialResolver,
}

impl ImagePusher {
    /// 新しい ImagePusher を作成
    pub fn new(docker: Docker) -> Self {
        Self {
            resolver: CredentialResolver::new(docker.clone()),
            docker,
        }
    }

    /// リゾルバを指定して作成（テスト用）
    pub fn with_resolver(docker: Docker, resolver: CredentialResolver) -> Self {
        Self { docker, resolver }
    }

    /// レジストリに対して認証
    ///
    /// 認証情報ストアが使えない場合は、前後の空白を除いた明示的な
    /// ユーザー名/パスワードへフォールバックします。ログイン交換で
    /// identity tokenを得た場合、パスワードは破棄済みです。
    pub async fn authenticate(
        &self,
        registry_url: Option<&str>,
        image_url: &str,
        username: &str,
        password: &str,
        check_credential_store: bool,
    ) -> BuildResult<Authenticated> {
        let mut auth = self
            .resolver
            .resolve(registry_url, image_url, check_credential_store)
            .await?;

        if !auth.is_usable() {
            auth.username = username.trim().to_string();
            auth.password = password.trim().to_string();
        }

        tracing::debug!("Authenticated against {}", auth.server_address);
        Ok(Authenticated { auth })
    }

    /// イメージをレジストリにプッシュ
    ///
    /// ストリーム中の最初のエラーが失敗として返されます。
    /// 進捗はシンクへ到着順に書き込まれます。
    pub async fn push(
        &self,
        image_url: &str,
        auth: &Authenticated,
        sink: &mut dyn ProgressSink,
    ) -> BuildResult<String> {
        let reference = ImageReference::parse(image_url)?;
        validate_tag(&reference.tag)?;

        let full_image = reference.familiar();
        let image = match &reference.registry {
            Some(registry) => format!("{}/{}", registry, reference.repository),
            None => reference.repository.clone(),
        };

        tracing::info!("Pushing image: {}", full_image);

        // 認証情報はbollardがX-Registry-Authヘッダとして
        // base64エンコードして送信する
        let credentials = auth.auth.to_docker_credentials();

        #[allow(deprecated)]
        let options = bollard::image::PushImageOptions::<String> {
            tag: reference.tag.clone(),
        };

        #[allow(deprecated)]
        let mut stream = self.docker.push_image(&image, Some(options), Some(credentials));

        let mut first_error: Option<String> = None;

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    handle_push_output(&info, &mut first_error, sink);
                }
                Err(e) => {
                    return Err(BuildError::PushFailed(e.to_string()));
                }
            }
        }

        if let Some(error) = first_error {
            sink.error(&error);
            return Err(BuildError::PushFailed(error));
        }

        tracing::info!("Successfully pushed: {}", full_image);
        Ok(full_image)
    }
}

/// プッシュ出力1件を処理
///
/// エラーは最初の1件だけを採用し、以降のメッセージは転送しません。
fn handle_push_output(
    info: &PushImageInfo,
    first_error: &mut Option<String>,
    sink: &mut dyn ProgressSink,
) {
    if let Some(error) = &info.error {
        if first_error.is_none() {
            *first_error = Some(error.clone());
        }
        return;
    }

    if first_error.is_some() {
        return;
    }

    if let Some(status) = &info.status {
        let progress = info.progress.as_deref().unwrap_or("");
        if progress.is_empty() {
            sink.info(status);
        } else {
            sink.info(&format!("{} {}", status, progress));
        }
    }
}

/// タグのバリデーション
///
/// Docker タグの制約:
/// - 128文字以下
/// - 英数字、ピリオド、ハイフン、アンダースコアのみ
/// - 先頭はピリオドまたはハイフンではない
fn validate_tag(tag: &str) -> BuildResult<()> {
    if tag.is_empty() {
        return Err(BuildError::InvalidTag {
            tag: "(empty)".to_string(),
        });
    }

    if tag.len() > 128 {
        return Err(BuildError::InvalidTag {
            tag: format!("Tag too long ({} characters, max 128)", tag.len()),
        });
    }

    if tag.starts_with('.') || tag.starts_with('-') {
        return Err(BuildError::InvalidTag {
            tag: tag.to_string(),
        });
    }

    for c in tag.chars() {
        if !c.is_ascii_alphanumeric() && c != '.' && c != '-' && c != '_' {
            return Err(BuildError::InvalidTag {
                tag: format!("Invalid character '{}' in tag: {}", c, tag),
            });
        }
    }

    Ok(())
}
