//! 终端 UI：通知写到 stdout，选择 / 输入从 stdin 读取一行
//!
//! stdin 行读取器由 REPL 与 UI 共享，避免两个 BufReader 争抢输入。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::host::{NotifyLevel, PickOptions, PromptOptions, UiCapability};

pub type SharedLines = Arc<Mutex<Lines<BufReader<Stdin>>>>;

pub struct TerminalUi {
    lines: SharedLines,
}

impl TerminalUi {
    pub fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
        }
    }

    /// 与 REPL 共享的行读取器
    pub fn lines(&self) -> SharedLines {
        self.lines.clone()
    }

    /// 打印提示并读取一行；EOF 或读取失败返回 None
    pub async fn read_line(&self, prompt: &str) -> Option<String> {
        let mut stdout = tokio::io::stdout();
        let _ = stdout.write_all(prompt.as_bytes()).await;
        let _ = stdout.flush().await;
        self.lines.lock().await.next_line().await.ok().flatten()
    }
}

impl Default for TerminalUi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UiCapability for TerminalUi {
    async fn notify(&self, message: &str, level: NotifyLevel) {
        let tag = match level {
            NotifyLevel::Info => "info",
            NotifyLevel::Warning => "warn",
            NotifyLevel::Error => "error",
        };
        let mut stdout = tokio::io::stdout();
        let _ = stdout.write_all(format!("[{tag}] {message}\n").as_bytes()).await;
    }

    async fn pick_one(&self, items: &[String], options: &PickOptions) -> Option<String> {
        if items.is_empty() {
            return None;
        }
        let mut menu = format!("{}\n", options.title);
        for (i, item) in items.iter().enumerate() {
            menu.push_str(&format!("  {:>2}) {}\n", i + 1, item));
        }
        let placeholder = options.placeholder.as_deref().unwrap_or("number, empty to cancel");
        let answer = self.read_line(&format!("{menu}[{placeholder}] > ")).await?;
        let index: usize = answer.trim().parse().ok()?;
        items.get(index.checked_sub(1)?).cloned()
    }

    async fn prompt_text(&self, options: &PromptOptions) -> Option<String> {
        let hint = options
            .value
            .as_deref()
            .or(options.placeholder.as_deref())
            .unwrap_or("");
        let answer = self
            .read_line(&format!("{} [{}] > ", options.prompt, hint))
            .await?;
        let answer = answer.trim();
        if answer.is_empty() {
            options.value.clone()
        } else {
            Some(answer.to_string())
        }
    }

    async fn progress_start(&self, title: &str) {
        let mut stdout = tokio::io::stdout();
        let _ = stdout.write_all(format!("… {title}\n").as_bytes()).await;
    }
}
