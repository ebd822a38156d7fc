//! 宿主能力：文件能力与 UI 能力
//!
//! 编辑器宿主（IDE、终端或测试替身）实现这两个 trait，由 Agent 在构造时注入；核心从不探测宿主的具体类型。
//! 提供的实现：
//! - **local**: 本地目录工作区（walkdir 遍历、glob 排除、正则搜索、路径沙箱）
//! - **memory**: 内存工作区（测试 / 嵌入用，记录写入与打开）
//! - **scripted**: 脚本化 UI（预设选择与输入，记录通知）
//! - **terminal**: 终端 UI（stdin / stdout）

pub mod local;
pub mod memory;
pub mod scripted;
pub mod terminal;

use std::future::Future;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::AgentError;

pub use local::LocalWorkspace;
pub use memory::InMemoryWorkspace;
pub use scripted::ScriptedUi;
pub use terminal::TerminalUi;

/// 单行匹配
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMatch {
    /// 1 起始行号
    pub line: usize,
    pub text: String,
}

/// 单个文件的搜索结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub path: String,
    pub matches: Vec<LineMatch>,
}

/// 已在编辑器中打开的文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorHandle {
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct PickOptions {
    pub title: String,
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    pub prompt: String,
    pub placeholder: Option<String>,
    pub value: Option<String>,
}

/// 文件能力：读写、枚举、内容搜索、打开文档
#[async_trait]
pub trait FileCapability: Send + Sync {
    async fn read(&self, path: &str) -> Result<String, AgentError>;

    async fn write(&self, path: &str, content: &str) -> Result<(), AgentError>;

    async fn exists(&self, path: &str) -> bool;

    /// 工作区内全部文件（宿主决定排序与过滤）
    async fn list_workspace_files(&self) -> Result<Vec<String>, AgentError>;

    /// 按正则模式搜索文件内容，只返回有匹配的文件
    async fn search_content(&self, pattern: &str) -> Result<Vec<SearchHit>, AgentError>;

    async fn open(&self, path: &str) -> Result<EditorHandle, AgentError>;

    /// 当前活动编辑器中的文档路径
    async fn active_document(&self) -> Option<String>;

    /// 工作区根目录（多根工作区时按宿主顺序）
    fn workspace_roots(&self) -> Vec<PathBuf>;
}

/// UI 能力：通知、选择、输入、进度
#[async_trait]
pub trait UiCapability: Send + Sync {
    async fn notify(&self, message: &str, level: NotifyLevel);

    /// 返回 None 表示用户取消
    async fn pick_one(&self, items: &[String], options: &PickOptions) -> Option<String>;

    /// 返回 None 表示用户取消
    async fn prompt_text(&self, options: &PromptOptions) -> Option<String>;

    async fn progress_start(&self, _title: &str) {}

    async fn progress_end(&self) {}
}

/// 在进度提示中执行任务：开始前 progress_start，结束后 progress_end
pub async fn with_progress<F, T>(ui: &dyn UiCapability, title: &str, task: F) -> T
where
    F: Future<Output = T> + Send,
{
    ui.progress_start(title).await;
    let out = task.await;
    ui.progress_end().await;
    out
}
