//! 短期记忆：对话历史
//!
//! 保留最近 N 轮对话（user/assistant 对），超出时自动剪枝；to_context 把历史转为 Request 的上下文片段。

use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// 单条消息
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// 最近 N 轮对话（每轮含 user + assistant，故最多保留 max_turns*2 条消息）
#[derive(Clone, Debug)]
pub struct ConversationMemory {
    messages: Vec<Message>,
    max_turns: usize,
}

impl ConversationMemory {
    pub fn new(max_turns: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_turns,
        }
    }

    pub fn push(&mut self, msg: Message) {
        self.messages.push(msg);
        self.prune();
    }

    /// 记录一轮完整对话
    pub fn push_turn(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.push(Message::user(user));
        self.push(Message::assistant(assistant));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// 转为上下文片段（"User: ..." / "Assistant: ..."），按时间顺序
    pub fn to_context(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| match m.role {
                Role::User => format!("User: {}", m.content),
                _ => format!("Assistant: {}", m.content),
            })
            .collect()
    }

    fn prune(&mut self) {
        let keep = self.max_turns * 2;
        if self.messages.len() > keep {
            self.messages.drain(..self.messages.len() - keep);
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_keeps_latest_turns() {
        let mut mem = ConversationMemory::new(2);
        for i in 0..5 {
            mem.push_turn(format!("q{i}"), format!("a{i}"));
        }
        assert_eq!(mem.len(), 4);
        assert_eq!(mem.messages()[0].content, "q3");
    }

    #[test]
    fn test_to_context_labels_roles() {
        let mut mem = ConversationMemory::new(5);
        mem.push_turn("where is main?", "src/main.rs");
        assert_eq!(
            mem.to_context(),
            vec!["User: where is main?", "Assistant: src/main.rs"]
        );
    }
}
