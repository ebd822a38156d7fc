//! LLM 能力抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 LlmClient：complete（非流式）、complete_stream（Token 流）。
//! complete_streaming 是基于 complete_stream 的默认实现：逐个 Token 回调并返回拼接后的全文。

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use thiserror::Error;

use crate::memory::Message;

/// LLM 调用错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Stream interrupted: {0}")]
    Stream(String),
}

/// Token 流
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// LLM 客户端 trait：prompt + 上下文片段 -> 文本
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成
    async fn complete(&self, prompt: &str, context: &[String]) -> Result<String, LlmError>;

    /// 流式完成，返回 Token 流
    async fn complete_stream(
        &self,
        prompt: &str,
        context: &[String],
    ) -> Result<TokenStream, LlmError>;

    /// 流式完成并逐 Token 回调，返回完整文本
    async fn complete_streaming(
        &self,
        prompt: &str,
        context: &[String],
        on_token: &mut (dyn for<'t> FnMut(&'t str) + Send),
    ) -> Result<String, LlmError> {
        let mut stream = self.complete_stream(prompt, context).await?;
        let mut full = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if chunk.is_empty() {
                continue;
            }
            on_token(&chunk);
            full.push_str(&chunk);
        }
        Ok(full)
    }

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}

/// 将 prompt 与上下文片段拼成消息列表：上下文作为 system 消息，prompt 作为 user 消息
pub fn build_messages(prompt: &str, context: &[String]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2);
    let snippets: Vec<&str> = context
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !snippets.is_empty() {
        messages.push(Message::system(format!(
            "Relevant context from earlier in the session:\n\n{}",
            snippets.join("\n\n")
        )));
    }
    messages.push(Message::user(prompt));
    messages
}
