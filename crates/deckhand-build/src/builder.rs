//! イメージビルド
//!
//! ビルドコンテキストを組み立ててデーモンへビルドを依頼し、
//! レスポンスストリームを進捗シンクへ流します。

use crate::context::ContextBuilder;
use crate::error::{BuildError, BuildResult};
use crate::progress::ProgressSink;
use bollard::Docker;
use bollard::image::BuildImageOptions;
use bollard::models::BuildInfo;
use futures_util::stream::StreamExt;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

pub struct ImageBuilder {
    docker: Docker,
}

impl ImageBuilder {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// イメージをビルド
    ///
    /// `registry_auths` には設定済みの全レジストリの認証情報を渡します。
    /// マルチステージビルドがプライベートなベースイメージを参照しても
    /// 成功するように、単一レジストリ分ではなく全件を添付します。
    ///
    /// ストリーム中の最初のエラーメッセージがビルドの失敗として
    /// 返されます。エラー以降の情報メッセージはシンクへ転送されませんが、
    /// リソースを漏らさないようストリームは閉じるまで読み切ります。
    pub async fn build(
        &self,
        context_path: &Path,
        dockerfile_path: &Path,
        tag: &str,
        build_args: &BTreeMap<String, String>,
        registry_auths: HashMap<String, bollard::auth::DockerCredentials>,
        sink: &mut dyn ProgressSink,
    ) -> BuildResult<()> {
        tracing::info!("Building image: {}", tag);

        let (context_data, relative_dockerfile) =
            ContextBuilder::assemble(context_path, dockerfile_path)?;

        // build_argsを&str型に変換
        let build_args_refs: HashMap<&str, &str> = build_args
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let options = BuildImageOptions {
            dockerfile: relative_dockerfile.as_str(),
            t: tag,
            buildargs: build_args_refs,
            rm: true,
            forcerm: true,
            ..Default::default()
        };

        tracing::debug!("Build options: {:?}", options);
        if !build_args.is_empty() {
            tracing::debug!("Build args: {:?}", build_args);
        }

        // ビルドストリームの開始
        use bytes::Bytes;
        use http_body_util::{Either, Full};
        let context_bytes = Bytes::from(context_data);
        let body = Full::new(context_bytes);
        let credentials = if registry_auths.is_empty() {
            None
        } else {
            Some(registry_auths)
        };
        let mut stream = self
            .docker
            .build_image(options, credentials, Some(Either::Left(body)));

        // 最初のエラーを保持しつつ、ストリームは閉じるまで読み切る
        let mut first_error: Option<String> = None;

        while let Some(msg) = stream.next().await {
            match msg {
                Ok(output) => {
                    handle_build_output(&output, &mut first_error, sink);
                }
                Err(e) => {
                    return Err(BuildError::DockerConnection(e));
                }
            }
        }

        if let Some(error) = first_error {
            sink.error(&error);
            return Err(BuildError::BuildFailed(error));
        }

        tracing::info!("Successfully built: {}", tag);
        Ok(())
    }

    /// イメージの存在確認
    pub async fn image_exists(&self, image_tag: &str) -> BuildResult<bool> {
        match self.docker.inspect_image(image_tag).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(BuildError::DockerConnection(e)),
        }
    }
}

/// ビルド出力1件を処理
///
/// エラーは最初の1件だけを採用します。以降のメッセージは転送しません。
fn handle_build_output(
    output: &BuildInfo,
    first_error: &mut Option<String>,
    sink: &mut dyn ProgressSink,
) {
    if let Some(error) = extract_build_error(output) {
        if first_error.is_none() {
            *first_error = Some(error);
        }
        return;
    }

    if first_error.is_some() {
        return;
    }

    if let Some(stream) = &output.stream {
        sink.info(stream);
    }
    if let Some(status) = &output.status {
        sink.info(status);
    }
}

/// ビルド出力からエラーメッセージを取り出す
fn extract_build_error(output: &BuildInfo) -> Option<String> {
    if let Some(error) = &output.error {
        return Some(error.clone());
    }
    if let Some(detail) = &output.error_detail {
        return Some(
            detail
                .message
                .clone()
                .unwrap_or_else(|| "Unknown build error".to_string()),
        );
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{MemorySink, StreamMessage};
    use bollard::models::ErrorDetail;

    fn info(stream: &str) -> BuildInfo {
        BuildInfo {
            stream: Some(stream.to_string()),
            ..Default::default()
        }
    }

    fn error(message: &str) -> BuildInfo {
        BuildInfo {
            error: Some(message.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_error_wins() {
        let outputs = vec![
            info("Step 1/3 : FROM alpine"),
            error("first failure"),
            info("Step 2/3 : RUN true"),
            error("second failure"),
        ];

        let mut sink = MemorySink::new();
        let mut first_error = None;
        for output in &outputs {
            handle_build_output(output, &mut first_error, &mut sink);
        }

        assert_eq!(first_error.as_deref(), Some("first failure"));
        // エラー以降の情報メッセージは転送されない
        assert_eq!(
            sink.messages,
            vec![StreamMessage::Info("Step 1/3 : FROM alpine".to_string())]
        );
    }

    #[test]
    fn test_error_detail_used_when_error_absent() {
        let output = BuildInfo {
            error_detail: Some(ErrorDetail {
                message: Some("detailed failure".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert_eq!(
            extract_build_error(&output).as_deref(),
            Some("detailed failure")
        );
    }

    #[test]
    fn test_info_messages_forwarded_in_order() {
        let outputs = vec![info("a"), info("b"), info("c")];

        let mut sink = MemorySink::new();
        let mut first_error = None;
        for output in &outputs {
            handle_build_output(output, &mut first_error, &mut sink);
        }

        assert!(first_error.is_none());
        assert_eq!(
            sink.messages,
            vec![
                StreamMessage::Info("a".to_string()),
                StreamMessage::Info("b".to_string()),
                StreamMessage::Info("c".to_string()),
            ]
        );
    }

    #[tokio::test]
    #[ignore] // Docker接続が必要なため、通常のテストではスキップ
    async fn test_build_simple_image() {
        let docker = Docker::connect_with_local_defaults().unwrap();
        let builder = ImageBuilder::new(docker);

        use std::fs;
        use tempfile::tempdir;

        let temp_dir = tempdir().unwrap();
        let dockerfile = temp_dir.path().join("Dockerfile");
        fs::write(&dockerfile, "FROM alpine:latest\nCMD echo 'test'").unwrap();

        let mut sink = MemorySink::new();
        let result = builder
            .build(
                temp_dir.path(),
                &dockerfile,
                "deckhand-test:latest",
                &BTreeMap::new(),
                HashMap::new(),
                &mut sink,
            )
            .await;

        assert!(result.is_ok());

        // クリーンアップ
        builder
            .docker
            .remove_image(
                "deckhand-test:latest",
                None::<bollard::query_parameters::RemoveImageOptions>,
                None,
            )
            .await
            .ok();
    }
}
