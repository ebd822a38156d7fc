//! Search 执行器：从 prompt 提取搜索词，在工作区内容中搜索
//!
//! 零匹配不是错误，返回信息性的 Search 动作。

use async_trait::async_trait;

use crate::core::{Action, ActionKind, AgentError, Request};
use crate::executors::{ActionExecutor, ExecutorContext};
use crate::host::{with_progress, NotifyLevel, PromptOptions, SearchHit};

const STOP_WORDS: &[&str] = &["search", "find", "for", "the", "a", "an", "in", "on", "at"];

/// 结果摘要里最多列出的文件数
const SUMMARY_FILES: usize = 10;
/// 每个文件最多列出的匹配行
const SUMMARY_LINES: usize = 3;

/// 小写、去标点、去停用词后的搜索词（去重，保持顺序）
pub fn search_terms(prompt: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for raw in prompt.to_lowercase().split_whitespace() {
        let word = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '_');
        if word.is_empty() || STOP_WORDS.contains(&word) {
            continue;
        }
        if !terms.iter().any(|t| t == word) {
            terms.push(word.to_string());
        }
    }
    terms
}

/// 搜索词逐个转义后用 `|` 连接为正则
pub fn search_pattern(terms: &[String]) -> String {
    terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|")
}

fn summarize(hits: &[SearchHit], pattern: &str) -> String {
    let total: usize = hits.iter().map(|h| h.matches.len()).sum();
    let mut out = format!(
        "Found {total} matches in {} files for '{pattern}'\n",
        hits.len()
    );
    for hit in hits.iter().take(SUMMARY_FILES) {
        out.push_str(&format!("\n{}:\n", hit.path));
        for m in hit.matches.iter().take(SUMMARY_LINES) {
            let line: String = m.text.trim().chars().take(100).collect();
            out.push_str(&format!("  {:4}: {}\n", m.line, line));
        }
        if hit.matches.len() > SUMMARY_LINES {
            out.push_str(&format!(
                "  ... ({} more matches)\n",
                hit.matches.len() - SUMMARY_LINES
            ));
        }
    }
    if hits.len() > SUMMARY_FILES {
        out.push_str(&format!("\n... and {} more files\n", hits.len() - SUMMARY_FILES));
    }
    out
}

pub struct SearchExecutor {
    ctx: ExecutorContext,
}

impl SearchExecutor {
    pub fn new(ctx: ExecutorContext) -> Self {
        Self { ctx }
    }

    /// prompt 去掉停用词后为空时向用户询问搜索内容
    async fn terms_for(&self, request: &Request) -> Vec<String> {
        let terms = search_terms(request.prompt());
        if !terms.is_empty() {
            return terms;
        }
        let options = PromptOptions {
            prompt: "What should I search for?".to_string(),
            placeholder: Some("search terms".to_string()),
            value: None,
        };
        match self.ctx.ui.prompt_text(&options).await {
            Some(text) => search_terms(&text),
            None => Vec::new(),
        }
    }
}

#[async_trait]
impl ActionExecutor for SearchExecutor {
    fn kind(&self) -> ActionKind {
        ActionKind::Search
    }

    fn context(&self) -> &ExecutorContext {
        &self.ctx
    }

    async fn run(&self, request: &Request, action: &Action) -> Result<Action, AgentError> {
        let terms = self.terms_for(request).await;
        if terms.is_empty() {
            let message = "Nothing to search for: the request has no search terms".to_string();
            self.ctx.ui.notify(&message, NotifyLevel::Info).await;
            return Ok(Action::executed(
                ActionKind::Search,
                None,
                message,
                action.reasoning.clone(),
            ));
        }

        let pattern = search_pattern(&terms);
        tracing::info!(pattern = %pattern, "searching workspace");
        let hits = with_progress(
            self.ctx.ui.as_ref(),
            "Searching workspace",
            self.ctx.files.search_content(&pattern),
        )
        .await?;

        let Some(first) = hits.first() else {
            let message = format!("No matches found for '{pattern}'");
            self.ctx.ui.notify(&message, NotifyLevel::Info).await;
            return Ok(Action::executed(
                ActionKind::Search,
                None,
                message,
                action.reasoning.clone(),
            ));
        };

        let total: usize = hits.iter().map(|h| h.matches.len()).sum();
        self.ctx
            .ui
            .notify(
                &format!("Found {total} matches in {} files", hits.len()),
                NotifyLevel::Info,
            )
            .await;

        if self.ctx.open_first_match {
            if let Err(e) = self.ctx.files.open(&first.path).await {
                tracing::warn!(path = %first.path, error = %e, "could not open first match");
            }
        }

        Ok(Action::executed(
            ActionKind::Search,
            Some(first.path.clone()),
            summarize(&hits, &pattern),
            action.reasoning.clone(),
        ))
    }
}
