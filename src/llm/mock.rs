//! Mock LLM 客户端（用于测试与无 API Key 的本地运行）
//!
//! - MockLlmClient：回显 prompt，分类器会因 JSON 解析失败回退到关键词匹配
//! - ScriptedLlmClient：按顺序返回预设回复（或错误），并记录收到的 prompt，便于断言

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream;

use crate::llm::{LlmClient, LlmError, TokenStream};

/// Mock 客户端：回显用户 prompt
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str, _context: &[String]) -> Result<String, LlmError> {
        Ok(format!("Echo from Mock: {prompt}"))
    }

    async fn complete_stream(
        &self,
        prompt: &str,
        context: &[String],
    ) -> Result<TokenStream, LlmError> {
        let content = self.complete(prompt, context).await?;
        Ok(Box::pin(stream::iter(split_tokens(&content))))
    }
}

/// 脚本化客户端：依次弹出预设回复；队列耗尽后使用 fallback（默认报错）
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    fallback: Option<Result<String, LlmError>>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条成功回复
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()))
    }

    /// 追加一次失败
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(Err(LlmError::Api(message.into())))
    }

    /// 队列耗尽后每次都返回该回复
    pub fn always(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(Ok(text.into()));
        self
    }

    /// 每次调用前等待，用于超时测试
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(self, item: Result<String, LlmError>) -> Self {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(item);
        }
        self
    }

    /// 已收到的 prompt（按调用顺序）
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn next_reply(&self) -> Result<String, LlmError> {
        let queued = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        queued
            .or_else(|| self.fallback.clone())
            .unwrap_or_else(|| Err(LlmError::Api("no scripted reply left".to_string())))
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, prompt: &str, _context: &[String]) -> Result<String, LlmError> {
        if let Ok(mut p) = self.prompts.lock() {
            p.push(prompt.to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_reply()
    }

    async fn complete_stream(
        &self,
        prompt: &str,
        context: &[String],
    ) -> Result<TokenStream, LlmError> {
        let content = self.complete(prompt, context).await?;
        Ok(Box::pin(stream::iter(split_tokens(&content))))
    }
}

/// 按空白切分为 Token（保留空白），模拟流式输出
fn split_tokens(content: &str) -> Vec<Result<String, LlmError>> {
    content
        .split_inclusive(char::is_whitespace)
        .map(|t| Ok(t.to_string()))
        .collect()
}
