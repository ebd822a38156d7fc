//! 动作执行器
//!
//! 每种 ActionKind 对应一个执行器：run 返回 Result，execute（默认实现）把错误转为 Respond 动作并通过 UI 通知，
//! 因而执行器永不向 Agent 抛错。Executors 持有全部五个执行器，dispatch 对 kind 做穷尽匹配。

pub mod analyze;
pub mod create;
pub mod edit;
pub mod naming;
pub mod respond;
pub mod search;

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::{Action, ActionKind, AgentError, Request};
use crate::host::{FileCapability, NotifyLevel, PickOptions, UiCapability};
use crate::llm::BoundedLlm;

pub use analyze::AnalyzeExecutor;
pub use create::CreateExecutor;
pub use edit::EditExecutor;
pub use respond::RespondExecutor;
pub use search::SearchExecutor;

/// 执行器共享的能力与参数
#[derive(Clone)]
pub struct ExecutorContext {
    pub llm: BoundedLlm,
    pub files: Arc<dyn FileCapability>,
    pub ui: Arc<dyn UiCapability>,
    /// Edit / Analyze 选择框最多列出的文件数
    pub picker_limit: usize,
    pub open_first_match: bool,
}

/// 执行器 trait
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    fn kind(&self) -> ActionKind;

    fn context(&self) -> &ExecutorContext;

    /// 执行副作用；失败时返回错误，由 execute 统一转换
    async fn run(&self, request: &Request, action: &Action) -> Result<Action, AgentError>;

    /// 执行并吞掉错误：失败转为 Respond 动作，content 说明失败原因
    async fn execute(&self, request: &Request, action: &Action) -> Action {
        let kind = self.kind();
        match self.run(request, action).await {
            Ok(result) => {
                tracing::info!(
                    kind = %kind,
                    result_kind = %result.kind,
                    target = result.target.as_deref().unwrap_or("-"),
                    "action executed"
                );
                result
            }
            Err(e) => {
                let message = format!("{kind} action failed: {e}");
                tracing::warn!(kind = %kind, error = %e, "action failed");
                let level = match e {
                    AgentError::Cancelled(_) => NotifyLevel::Warning,
                    _ => NotifyLevel::Error,
                };
                self.context().ui.notify(&message, level).await;
                Action::failure(
                    format!("Error: {message}"),
                    format!("{kind} could not be completed"),
                )
            }
        }
    }
}

/// 全部执行器
pub struct Executors {
    search: SearchExecutor,
    edit: EditExecutor,
    create: CreateExecutor,
    analyze: AnalyzeExecutor,
    respond: RespondExecutor,
}

impl Executors {
    pub fn new(ctx: ExecutorContext) -> Self {
        Self {
            search: SearchExecutor::new(ctx.clone()),
            edit: EditExecutor::new(ctx.clone()),
            create: CreateExecutor::new(ctx.clone()),
            analyze: AnalyzeExecutor::new(ctx.clone()),
            respond: RespondExecutor::new(ctx),
        }
    }

    pub async fn dispatch(&self, request: &Request, action: &Action) -> Action {
        match action.kind {
            ActionKind::Search => self.search.execute(request, action).await,
            ActionKind::Edit => self.edit.execute(request, action).await,
            ActionKind::Create => self.create.execute(request, action).await,
            ActionKind::Analyze => self.analyze.execute(request, action).await,
            ActionKind::Respond => self.respond.execute(request, action).await,
        }
    }
}

/// 整段输出被一个 ``` 围栏包裹（可带语言标记）
static WRAPPED_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A\s*```[\w+#.-]*[ \t]*\r?\n(.*?)\r?\n?[ \t]*```\s*\z")
        .expect("static fence regex")
});

/// 单行引导语（以冒号结尾）+ 围栏 + 至多一行结束语
static LEAD_IN_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?s)\A[ \t]*[^\s`#][^\n`]*:[ \t]*\r?\n\s*",
        r"```[\w+#.-]*[ \t]*\r?\n(.*?)\r?\n?[ \t]*```",
        r"[ \t]*(?:\r?\n[^\n`]*)?\s*\z",
    ))
    .expect("static lead-in fence regex")
});

/// 去掉模型输出外层的 Markdown 代码围栏；正文内部的代码块原样保留，没有外层围栏时只去掉首尾空行
pub fn strip_code_fence(text: &str) -> String {
    let body = WRAPPED_FENCE_RE
        .captures(text)
        .or_else(|| LEAD_IN_FENCE_RE.captures(text))
        .and_then(|c| c.get(1))
        .map_or(text, |m| m.as_str());
    body.trim_start_matches(['\r', '\n']).trim_end().to_string()
}

/// Edit / Analyze 的目标文件：活动文档优先，否则从前 picker_limit 个工作区文件中选择
pub async fn resolve_target(ctx: &ExecutorContext, verb: &str) -> Result<String, AgentError> {
    if let Some(active) = ctx.files.active_document().await {
        return Ok(active);
    }
    let files = ctx.files.list_workspace_files().await?;
    if files.is_empty() {
        return Err(AgentError::NoTarget("workspace has no files".to_string()));
    }
    let items: Vec<String> = files.into_iter().take(ctx.picker_limit).collect();
    let options = PickOptions {
        title: format!("Select a file to {verb}"),
        placeholder: Some("file path".to_string()),
    };
    ctx.ui
        .pick_one(&items, &options)
        .await
        .ok_or_else(|| AgentError::Cancelled("no file selected".to_string()))
}
