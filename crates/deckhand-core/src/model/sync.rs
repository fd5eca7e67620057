//! ファイル同期設定

use serde::{Deserialize, Serialize};

/// ファイル同期パスの定義
///
/// 同期ランタイム自体は外部コラボレータ。ここでは `deckhand remove sync`
/// が編集する設定エントリのみを保持します。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// 対象Podを選ぶセレクタ（カンマ区切りの key=value リスト）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// ローカルの同期元パス
    pub local_path: String,
    /// コンテナ内の同期先パス
    pub container_path: String,
}

impl SyncConfig {
    /// セレクタ文字列が一致するか
    pub fn matches_selector(&self, selector: &str) -> bool {
        self.selector.as_deref() == Some(selector)
    }
}
