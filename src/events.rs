//! Agent 事件：供展示层（终端、Webview 等）渲染对话与流式输出
//!
//! 事件只是通知，不属于 process_request 的返回契约；没有订阅者时直接丢弃。

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::memory::Role;

/// 对话消息
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// 占位的“思考中”消息
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_thinking: bool,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::build(Role::User, content.into(), false)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::build(Role::Assistant, content.into(), false)
    }

    pub fn thinking() -> Self {
        Self::build(Role::Assistant, "Thinking...".to_string(), true)
    }

    fn build(role: Role, content: String, is_thinking: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            timestamp: Utc::now(),
            is_thinking,
        }
    }
}

/// 单个事件（序列化为带 type 标签的 JSON）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    Message(ChatMessage),
    /// 流式回复的一个片段
    Token {
        #[serde(rename = "messageId")]
        message_id: String,
        token: String,
    },
    /// 流式回复结束
    Done {
        #[serde(rename = "messageId")]
        message_id: String,
        #[serde(rename = "final")]
        is_final: bool,
    },
}

impl AgentEvent {
    pub fn done(message_id: impl Into<String>) -> Self {
        AgentEvent::Done {
            message_id: message_id.into(),
            is_final: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_event_shape() {
        let ev = AgentEvent::Token {
            message_id: "m1".to_string(),
            token: "he".to_string(),
        };
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["type"], "token");
        assert_eq!(v["messageId"], "m1");
        assert_eq!(v["token"], "he");
    }

    #[test]
    fn test_done_is_final() {
        let v = serde_json::to_value(AgentEvent::done("m1")).unwrap();
        assert_eq!(v["type"], "done");
        assert_eq!(v["final"], true);
    }

    #[test]
    fn test_thinking_flag_only_when_set() {
        let v = serde_json::to_value(AgentEvent::Message(ChatMessage::user("hi"))).unwrap();
        assert_eq!(v["role"], "user");
        assert!(v.get("isThinking").is_none());
        let v = serde_json::to_value(AgentEvent::Message(ChatMessage::thinking())).unwrap();
        assert_eq!(v["isThinking"], true);
    }
}
