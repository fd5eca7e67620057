//! ビルドコンテキストの組み立て
//!
//! コンテキストディレクトリを `.dockerignore` の除外規則を適用しながら
//! tar.gzアーカイブにまとめます。所有者は uid/gid 0/0 に正規化され、
//! ホストユーザーに依存しない再現可能なビルドになります。

use crate::error::{BuildError, BuildResult};
use flate2::Compression;
use flate2::write::GzEncoder;
use ignore::WalkBuilder;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tar::{Builder, EntryType, Header};

/// コンテキストルートの除外規則ファイル
pub const DOCKERIGNORE_FILE: &str = ".dockerignore";

pub struct ContextBuilder;

impl ContextBuilder {
    /// ビルドコンテキストをtar.gzアーカイブとして作成
    ///
    /// 戻り値はアーカイブ本体と、アーカイブエントリ形式
    /// （プラットフォーム非依存、`/` 区切り）のDockerfile相対パス。
    ///
    /// Dockerfileと `.dockerignore` 自体は、パターンに一致しても
    /// 除外されません。
    pub fn assemble(
        context_path: &Path,
        dockerfile_path: &Path,
    ) -> BuildResult<(Vec<u8>, String)> {
        if !context_path.is_dir() {
            return Err(BuildError::ContextNotFound(context_path.to_path_buf()));
        }
        let context_dir = context_path
            .canonicalize()
            .map_err(|_| BuildError::ContextNotFound(context_path.to_path_buf()))?;

        // 読み取り可能であることの確認
        std::fs::read_dir(&context_dir)?;

        let dockerfile = dockerfile_path
            .canonicalize()
            .map_err(|_| BuildError::DockerfileNotFound(dockerfile_path.to_path_buf()))?;
        let relative_dockerfile = dockerfile.strip_prefix(&context_dir).map_err(|_| {
            BuildError::DockerfileOutsideContext {
                dockerfile: dockerfile.clone(),
                context: context_dir.clone(),
            }
        })?;

        // Dockerfile名をプラットフォーム非依存の形式へ正規化
        let canonical_dockerfile = canonical_tar_path(relative_dockerfile);

        let matcher = read_dockerignore(&context_dir)?;

        tracing::debug!("Creating build context from: {}", context_dir.display());

        let mut archive_data = Vec::new();
        {
            let encoder = GzEncoder::new(&mut archive_data, Compression::default());
            let mut tar = Builder::new(encoder);
            tar.follow_symlinks(false);

            let walker = WalkBuilder::new(&context_dir)
                .standard_filters(false)
                .follow_links(false)
                .sort_by_file_name(|a, b| a.cmp(b))
                .build();

            for entry in walker {
                let entry = entry.map_err(|e| BuildError::Io(std::io::Error::other(e)))?;
                let path = entry.path();
                if path == context_dir {
                    continue;
                }

                let Some(file_type) = entry.file_type() else {
                    continue;
                };
                let Ok(relative) = path.strip_prefix(&context_dir) else {
                    continue;
                };
                let entry_name = canonical_tar_path(relative);

                if is_excluded(
                    &matcher,
                    relative,
                    file_type.is_dir(),
                    &entry_name,
                    &canonical_dockerfile,
                ) {
                    tracing::trace!("Excluded from context: {}", entry_name);
                    continue;
                }

                append_entry(&mut tar, path, relative, file_type)?;
            }

            let encoder = tar.into_inner().map_err(BuildError::Io)?;
            encoder.finish().map_err(BuildError::Io)?;
        }

        tracing::debug!("Build context created: {} bytes", archive_data.len());
        check_context_size(archive_data.len());

        Ok((archive_data, canonical_dockerfile))
    }
}

/// `.dockerignore` を読み込んでマッチャを構築
///
/// ファイルが無い場合は何も除外しないマッチャを返します。
/// 不正なパターンはエラーになります。
fn read_dockerignore(context_dir: &Path) -> BuildResult<Gitignore> {
    let mut builder = GitignoreBuilder::new(context_dir);

    let path = context_dir.join(DOCKERIGNORE_FILE);
    if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            builder.add_line(None, line).map_err(|e| {
                BuildError::InvalidIgnorePattern(format!("{}: {}", line, e))
            })?;
        }
    }

    builder
        .build()
        .map_err(|e| BuildError::InvalidIgnorePattern(e.to_string()))
}

/// エントリが除外対象かどうか
///
/// ビルドに必須のファイル（Dockerfile, .dockerignore）は
/// パターンに一致しても常に含めます。
fn is_excluded(
    matcher: &Gitignore,
    relative: &Path,
    is_dir: bool,
    entry_name: &str,
    canonical_dockerfile: &str,
) -> bool {
    if entry_name == canonical_dockerfile || entry_name == DOCKERIGNORE_FILE {
        return false;
    }
    matcher.matched_path_or_any_parents(relative, is_dir).is_ignore()
}

/// 所有者を0/0に正規化してエントリを追加
fn append_entry<W: Write>(
    tar: &mut Builder<W>,
    path: &Path,
    relative: &Path,
    file_type: std::fs::FileType,
) -> BuildResult<()> {
    let metadata = std::fs::symlink_metadata(path)?;

    let mut header = Header::new_gnu();
    header.set_metadata(&metadata);
    header.set_uid(0);
    header.set_gid(0);

    if file_type.is_dir() {
        header.set_entry_type(EntryType::Directory);
        header.set_size(0);
        tar.append_data(&mut header, relative, std::io::empty())?;
    } else if file_type.is_symlink() {
        let target = std::fs::read_link(path)?;
        header.set_entry_type(EntryType::Symlink);
        header.set_size(0);
        tar.append_link(&mut header, relative, &target)?;
    } else if file_type.is_file() {
        let mut file = File::open(path)?;
        tar.append_data(&mut header, relative, &mut file)?;
    }

    Ok(())
}

/// 相対パスをアーカイブエントリ形式（`/` 区切り）へ変換
fn canonical_tar_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// コンテキストサイズのチェックと警告
fn check_context_size(size: usize) {
    const MAX_CONTEXT_SIZE: usize = 500 * 1024 * 1024; // 500MB

    if size > MAX_CONTEXT_SIZE {
        tracing::warn!(
            "警告: ビルドコンテキストが大きすぎます（{}MB）\n\
             .dockerignoreファイルで不要なファイルを除外することを推奨します。",
            size / 1024 / 1024
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::tempdir;

    /// アーカイブを展開して (エントリ名 -> (uid, gid)) のマップを返す
    fn archive_entries(archive: &[u8]) -> BTreeMap<String, (u64, u64)> {
        let decoder = flate2::read::GzDecoder::new(archive);
        let mut tar = tar::Archive::new(decoder);

        let mut entries = BTreeMap::new();
        for entry in tar.entries().unwrap() {
            let entry = entry.unwrap();
            let path = entry.path().unwrap().to_string_lossy().into_owned();
            let uid = entry.header().uid().unwrap();
            let gid = entry.header().gid().unwrap();
            entries.insert(path, (uid, gid));
        }
        entries
    }

    #[test]
    fn test_assemble_includes_tree() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("file1.txt"), "content1").unwrap();
        let subdir = temp_dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        fs::write(subdir.join("file2.txt"), "content2").unwrap();

        let dockerfile = temp_dir.path().join("Dockerfile");
        fs::write(&dockerfile, "FROM alpine").unwrap();

        let (archive, relative) =
            ContextBuilder::assemble(temp_dir.path(), &dockerfile).unwrap();
        assert_eq!(relative, "Dockerfile");

        let entries = archive_entries(&archive);
        assert!(entries.contains_key("Dockerfile"));
        assert!(entries.contains_key("file1.txt"));
        assert!(entries.contains_key("subdir/file2.txt"));
    }

    #[test]
    fn test_assemble_normalizes_ownership() {
        let temp_dir = tempdir().unwrap();
        let dockerfile = temp_dir.path().join("Dockerfile");
        fs::write(&dockerfile, "FROM alpine").unwrap();
        fs::write(temp_dir.path().join("app.rs"), "fn main() {}").unwrap();

        let (archive, _) = ContextBuilder::assemble(temp_dir.path(), &dockerfile).unwrap();

        for (name, (uid, gid)) in archive_entries(&archive) {
            assert_eq!((uid, gid), (0, 0), "entry {} not owned by root", name);
        }
    }

    #[test]
    fn test_assemble_applies_dockerignore() {
        let temp_dir = tempdir().unwrap();
        let dockerfile = temp_dir.path().join("Dockerfile");
        fs::write(&dockerfile, "FROM alpine").unwrap();
        fs::write(temp_dir.path().join(".dockerignore"), "target/\n*.log\n").unwrap();
        fs::write(temp_dir.path().join("build.log"), "noise").unwrap();
        fs::write(temp_dir.path().join("main.rs"), "fn main() {}").unwrap();

        let target = temp_dir.path().join("target");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("binary"), "bin").unwrap();

        let (archive, _) = ContextBuilder::assemble(temp_dir.path(), &dockerfile).unwrap();
        let entries = archive_entries(&archive);

        assert!(entries.contains_key("main.rs"));
        assert!(!entries.contains_key("build.log"));
        assert!(!entries.contains_key("target"));
        assert!(!entries.contains_key("target/binary"));
    }

    #[test]
    fn test_build_files_never_excluded() {
        // パターンが全てに一致しても Dockerfile と .dockerignore は残る
        let temp_dir = tempdir().unwrap();
        let dockerfile = temp_dir.path().join("Dockerfile");
        fs::write(&dockerfile, "FROM alpine").unwrap();
        fs::write(temp_dir.path().join(".dockerignore"), "*\n").unwrap();
        fs::write(temp_dir.path().join("secret.env"), "x").unwrap();

        let (archive, _) = ContextBuilder::assemble(temp_dir.path(), &dockerfile).unwrap();
        let entries = archive_entries(&archive);

        assert!(entries.contains_key("Dockerfile"));
        assert!(entries.contains_key(".dockerignore"));
        assert!(!entries.contains_key("secret.env"));
    }

    #[test]
    fn test_nested_dockerfile_canonical_path() {
        let temp_dir = tempdir().unwrap();
        let docker_dir = temp_dir.path().join("docker");
        fs::create_dir(&docker_dir).unwrap();
        let dockerfile = docker_dir.join("Dockerfile.prod");
        fs::write(&dockerfile, "FROM alpine").unwrap();

        let (_, relative) = ContextBuilder::assemble(temp_dir.path(), &dockerfile).unwrap();
        assert_eq!(relative, "docker/Dockerfile.prod");
    }

    #[test]
    fn test_dockerfile_outside_context_rejected() {
        let context = tempdir().unwrap();
        let elsewhere = tempdir().unwrap();
        let dockerfile = elsewhere.path().join("Dockerfile");
        fs::write(&dockerfile, "FROM alpine").unwrap();

        let result = ContextBuilder::assemble(context.path(), &dockerfile);
        assert!(matches!(
            result,
            Err(BuildError::DockerfileOutsideContext { .. })
        ));
    }

    #[test]
    fn test_context_not_found() {
        let temp_dir = tempdir().unwrap();
        let dockerfile = temp_dir.path().join("Dockerfile");
        fs::write(&dockerfile, "FROM alpine").unwrap();

        let missing = temp_dir.path().join("missing");
        let result = ContextBuilder::assemble(&missing, &dockerfile);
        assert!(matches!(result, Err(BuildError::ContextNotFound(_))));
    }

    #[test]
    fn test_malformed_ignore_pattern() {
        let temp_dir = tempdir().unwrap();
        let dockerfile = temp_dir.path().join("Dockerfile");
        fs::write(&dockerfile, "FROM alpine").unwrap();
        fs::write(temp_dir.path().join(".dockerignore"), "foo[\n").unwrap();

        let result = ContextBuilder::assemble(temp_dir.path(), &dockerfile);
        assert!(matches!(result, Err(BuildError::InvalidIgnorePattern(_))));
    }
}
