use colored::Colorize;
use std::path::{Path, PathBuf};

/// 読み込んだ設定ファイルを表示
pub fn print_loaded_config(config_path: &Path) {
    println!(
        "{} {}",
        "設定ファイル:".dimmed(),
        config_path.display().to_string().cyan()
    );
}

/// 設定ファイルの場所からプロジェクトルートを決定
///
/// `.deckhand/` 内に置かれている場合はその親がルート。
pub fn project_root_of(config_path: &Path) -> PathBuf {
    let parent = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    if parent.file_name().is_some_and(|name| name == ".deckhand") {
        parent
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(parent)
    } else {
        parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_root_beside_config() {
        let root = project_root_of(Path::new("/work/app/deckhand.yaml"));
        assert_eq!(root, PathBuf::from("/work/app"));
    }

    #[test]
    fn test_project_root_inside_deckhand_dir() {
        let root = project_root_of(Path::new("/work/app/.deckhand/deckhand.yaml"));
        assert_eq!(root, PathBuf::from("/work/app"));
    }
}
