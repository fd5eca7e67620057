//! ポートフォワード設定

use serde::{Deserialize, Serialize};

/// ポートフォワードの定義
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortForwardConfig {
    /// 対象Podを選ぶセレクタ（カンマ区切りの key=value リスト）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// フォワードするポート番号
    pub ports: Vec<u16>,
}

impl PortForwardConfig {
    /// セレクタ文字列が一致するか
    pub fn matches_selector(&self, selector: &str) -> bool {
        self.selector.as_deref() == Some(selector)
    }

    /// 指定されたポートのいずれかを含むか
    pub fn contains_any(&self, ports: &[u16]) -> bool {
        self.ports.iter().any(|p| ports.contains(p))
    }
}
