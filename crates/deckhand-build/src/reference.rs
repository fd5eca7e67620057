//! イメージ参照のパースと正規化
//!
//! `registry/repository:tag` 形式の参照を分解し、公式レジストリ判定を行います。
//! レジストリ判定は先頭セグメントの形（`.` / `:` を含む、または `localhost`）
//! に基づくDockerの正規化規則に従います。文字列前方一致では判定しません。

use crate::error::{BuildError, BuildResult};
use std::fmt;

/// 公式インデックスとして扱うホスト名
pub const OFFICIAL_REGISTRY_HOSTS: &[&str] =
    &["docker.io", "index.docker.io", "registry-1.docker.io"];

/// デーモンからインデックス情報が取れない場合に使う既定値
pub const DEFAULT_INDEX_SERVER: &str = "https://index.docker.io/v1/";

/// パース済みのイメージ参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// レジストリホスト（暗黙の公式レジストリの場合は None）
    pub registry: Option<String>,
    /// リポジトリ名（例: chronista-club/deckhand）
    pub repository: String,
    /// タグ（未指定の場合は latest）
    pub tag: String,
}

impl ImageReference {
    /// 完全修飾形式の参照をパース
    ///
    /// # Examples
    /// - `ghcr.io/org/app:v1.0` -> registry=ghcr.io, repository=org/app, tag=v1.0
    /// - `myuser/app` -> registry=None, repository=myuser/app, tag=latest
    /// - `localhost:5000/app` -> registry=localhost:5000, repository=app, tag=latest
    pub fn parse(input: &str) -> BuildResult<Self> {
        let invalid = |message: &str| BuildError::InvalidReference {
            reference: input.to_string(),
            message: message.to_string(),
        };

        if input.is_empty() {
            return Err(invalid("reference is empty"));
        }
        if input.chars().any(char::is_whitespace) {
            return Err(invalid("reference contains whitespace"));
        }

        // タグの分離。最後の ':' 以降に '/' が含まれる場合は
        // レジストリのポート番号なのでタグなしとみなす
        let (name, tag) = match input.rfind(':') {
            Some(pos) if !input[pos + 1..].contains('/') => (&input[..pos], &input[pos + 1..]),
            _ => (input, "latest"),
        };

        if tag.is_empty() {
            return Err(invalid("tag is empty"));
        }
        if name.is_empty() {
            return Err(invalid("repository is empty"));
        }

        // 先頭セグメントがホスト形ならレジストリ
        let (registry, repository) = match name.split_once('/') {
            Some((first, rest)) if is_registry_host(first) => {
                (Some(first.to_string()), rest.to_string())
            }
            _ => (None, name.to_string()),
        };

        if repository.is_empty() || repository.split('/').any(str::is_empty) {
            return Err(invalid("repository is empty"));
        }

        Ok(Self {
            registry,
            repository,
            tag: tag.to_string(),
        })
    }

    /// 完全修飾形式に整形
    ///
    /// レジストリが暗黙の公式レジストリの場合は省略されます。
    pub fn familiar(&self) -> String {
        match &self.registry {
            Some(registry) if !OFFICIAL_REGISTRY_HOSTS.contains(&registry.as_str()) => {
                format!("{}/{}:{}", registry, self.repository, self.tag)
            }
            _ => format!("{}:{}", self.repository, self.tag),
        }
    }

    /// この参照が公式インデックスに解決されるか
    ///
    /// デーモンが報告するインデックスサーバー（`/info` の
    /// IndexServerAddress）を正規化して照合します。
    pub fn resolves_to_official_index(&self, index_server: &str) -> bool {
        let host = match &self.registry {
            None => return true,
            Some(host) => host.to_ascii_lowercase(),
        };

        OFFICIAL_REGISTRY_HOSTS.contains(&host.as_str())
            || host == normalize_index_host(index_server)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.familiar())
    }
}

/// 先頭セグメントがレジストリホストかどうか
///
/// Dockerの正規化規則: `.` か `:` を含む、または `localhost`。
fn is_registry_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

/// インデックスサーバーURLからホスト名部分を取り出す
///
/// 例: `https://index.docker.io/v1/` -> `index.docker.io`
pub fn normalize_index_host(server: &str) -> String {
    let without_scheme = server
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(server);
    let host = without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme);
    host.to_ascii_lowercase()
}
