//! ビルド/プッシュ進捗の出力
//!
//! デーモンからのストリームを {info|error, text} のメッセージ列として扱い、
//! 注入されたシンクへ到着順に書き出します。

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;

/// ストリーム上の1メッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMessage {
    Info(String),
    Error(String),
}

impl StreamMessage {
    pub fn is_error(&self) -> bool {
        matches!(self, StreamMessage::Error(_))
    }

    pub fn text(&self) -> &str {
        match self {
            StreamMessage::Info(text) | StreamMessage::Error(text) => text,
        }
    }
}

/// メッセージ列から最初のエラーを取り出す
///
/// エラー後にも情報メッセージが続くことがあるため、
/// 意味を持つのは常に最初のエラーです。
pub fn first_error<'a, I>(messages: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a StreamMessage>,
{
    messages.into_iter().find_map(|m| match m {
        StreamMessage::Error(text) => Some(text.as_str()),
        StreamMessage::Info(_) => None,
    })
}

/// 進捗メッセージの出力先
///
/// メッセージは到着順に書き込まれ、並べ替え・バッファリングされません。
pub trait ProgressSink {
    fn info(&mut self, text: &str);
    fn error(&mut self, text: &str);
}

/// ターミナルへの進捗表示
#[derive(Default)]
pub struct TerminalSink {
    last_status: String,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for TerminalSink {
    fn info(&mut self, text: &str) {
        let trimmed = text.trim_end();
        if trimmed.is_empty() {
            return;
        }

        // レイヤー進捗は同じ行に上書き、それ以外は1行ずつ
        if trimmed.contains('%') || trimmed.starts_with("Pushing") {
            print!("\r  ↑ {}     ", trimmed);
            std::io::stdout().flush().ok();
        } else if trimmed != self.last_status {
            println!("  {}", trimmed.cyan());
            self.last_status = trimmed.to_string();
        }
    }

    fn error(&mut self, text: &str) {
        println!();
        eprintln!("  {} {}", "✗".red().bold(), text);
    }
}

/// テスト用: メッセージを順番に記録するシンク
#[derive(Debug, Default)]
pub struct MemorySink {
    pub messages: Vec<StreamMessage>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for MemorySink {
    fn info(&mut self, text: &str) {
        self.messages.push(StreamMessage::Info(text.to_string()));
    }

    fn error(&mut self, text: &str) {
        self.messages.push(StreamMessage::Error(text.to_string()));
    }
}

/// ビルド中のスピナー表示
pub struct BuildProgress {
    progress_bar: ProgressBar,
}

impl BuildProgress {
    pub fn new(image_name: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        pb.set_message(format!("Building {}...", image_name));

        Self { progress_bar: pb }
    }

    pub fn set_message(&self, msg: &str) {
        self.progress_bar.set_message(msg.to_string());
    }

    pub fn finish_success(&self) {
        self.progress_bar.finish_with_message("Build completed ✓");
    }

    pub fn finish_error(&self, error: &str) {
        self.progress_bar
            .finish_with_message(format!("Build failed: {}", error));
    }
}
