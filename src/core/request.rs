//! 请求与响应信封
//!
//! Request 由调用方每轮创建，创建后不可变；Response 与 Request 一一对应，request_id 恒等于 Request.id。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{Action, AgentError};

/// 用户请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    id: String,
    prompt: String,
    timestamp: DateTime<Utc>,
    context: Vec<String>,
}

impl Request {
    /// 创建请求；prompt 去除首尾空白后为空时返回 EmptyPrompt
    pub fn new(prompt: impl Into<String>) -> Result<Self, AgentError> {
        Self::with_context(prompt, Vec::new())
    }

    pub fn with_context(
        prompt: impl Into<String>,
        context: Vec<String>,
    ) -> Result<Self, AgentError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(AgentError::EmptyPrompt);
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            prompt,
            timestamp: Utc::now(),
            context,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// 之前的上下文片段（按时间顺序）
    pub fn context(&self) -> &[String] {
        &self.context
    }
}

/// 响应信封：永远完整构造，失败时 action 为 Respond 且 content 为错误描述
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub request_id: String,
    pub action: Action,
    pub reasoning: String,
    pub timestamp: DateTime<Utc>,
}

impl Response {
    pub fn new(request: &Request, action: Action, reasoning: impl Into<String>) -> Self {
        Self {
            request_id: request.id().to_string(),
            action,
            reasoning: reasoning.into(),
            timestamp: Utc::now(),
        }
    }

    /// 出错时的响应：Respond + "Error: ..."
    pub fn error(request: &Request, message: impl std::fmt::Display) -> Self {
        let content = format!("Error: {message}");
        Self::new(
            request,
            Action::failure(content.clone(), "Request failed"),
            content,
        )
    }
}
