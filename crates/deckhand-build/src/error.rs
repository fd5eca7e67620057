use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Dockerfile not found: {0}")]
    DockerfileNotFound(PathBuf),

    #[error("Build context directory not found: {0}")]
    ContextNotFound(PathBuf),

    #[error("Dockerfile is outside the build context: {dockerfile} (context: {context})")]
    DockerfileOutsideContext {
        dockerfile: PathBuf,
        context: PathBuf,
    },

    #[error("Invalid .dockerignore pattern: {0}")]
    InvalidIgnorePattern(String),

    #[error("Invalid image reference '{reference}': {message}")]
    InvalidReference { reference: String, message: String },

    #[error("Invalid image tag: {tag}")]
    InvalidTag { tag: String },

    #[error("Registry authentication failed for {registry}: {message}")]
    AuthFailed { registry: String, message: String },

    #[error("Push requires authentication; call authenticate first")]
    NotAuthenticated,

    #[error("Build failed: {0}")]
    BuildFailed(String),

    #[error("Push failed: {0}")]
    PushFailed(String),

    #[error("Docker connection error: {0}")]
    DockerConnection(#[from] bollard::errors::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            BuildError::DockerfileNotFound(path) => {
                format!(
                    "Dockerfileが見つかりません: {}\n\
                     \n\
                     解決方法:\n\
                     1. Dockerfileのパスを確認してください\n\
                     2. deckhand.yamlで明示的にパスを指定してください:\n\
                        dockerfile: path/to/Dockerfile",
                    path.display()
                )
            }
            BuildError::ContextNotFound(path) => {
                format!(
                    "ビルドコンテキストが見つかりません: {}\n\
                     \n\
                     deckhand.yamlでcontextパスを確認してください。",
                    path.display()
                )
            }
            BuildError::BuildFailed(msg) => {
                format!(
                    "ビルドに失敗しました: {}\n\
                     \n\
                     Dockerfileの内容を確認してください。",
                    msg
                )
            }
            BuildError::NotAuthenticated => {
                "プッシュには認証が必要です。先にレジストリへログインしてください。".to_string()
            }
            _ => format!("{}", self),
        }
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;
