//! 动作模型：五种固定动作类型与分类 / 执行结果
//!
//! 同一个 Action 结构在一次请求中出现两次：分类结果（只有 kind + reasoning）
//! 和执行结果（kind + target + content + reasoning）。

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 动作类型（封闭枚举，分发处穷尽匹配）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// 在工作区文件内容中搜索
    Search,
    /// 修改已有文件
    Edit,
    /// 生成并创建新文件
    Create,
    /// 分析 / 解释已有文件
    Analyze,
    /// 直接回复（默认，也是所有失败路径的归宿）
    Respond,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Search,
        ActionKind::Edit,
        ActionKind::Create,
        ActionKind::Analyze,
        ActionKind::Respond,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Search => "search",
            ActionKind::Edit => "edit",
            ActionKind::Create => "create",
            ActionKind::Analyze => "analyze",
            ActionKind::Respond => "respond",
        }
    }

    /// 供分类 prompt 使用的一行描述
    pub fn description(&self) -> &'static str {
        match self {
            ActionKind::Search => "Search for code, text or files across the workspace",
            ActionKind::Edit => "Modify an existing file (fix, refactor, update)",
            ActionKind::Create => "Create a new file, component, function or script",
            ActionKind::Analyze => "Analyze, review or explain existing code",
            ActionKind::Respond => "Answer a question or chat without touching files",
        }
    }

    /// 按名称解析（大小写不敏感），未知名称返回 None
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 动作：分类结果或执行结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    /// 目标文件路径（Edit / Create / Analyze 有值）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// 载荷或生成的文本
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// 人类可读的理由
    pub reasoning: String,
}

impl Action {
    /// 分类结果：只有类型与理由
    pub fn classified(kind: ActionKind, reasoning: impl Into<String>) -> Self {
        Self {
            kind,
            target: None,
            content: None,
            reasoning: reasoning.into(),
        }
    }

    pub fn executed(
        kind: ActionKind,
        target: Option<String>,
        content: impl Into<String>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            target,
            content: Some(content.into()),
            reasoning: reasoning.into(),
        }
    }

    /// 失败路径：统一转为 Respond，content 携带错误描述
    pub fn failure(message: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self::executed(ActionKind::Respond, None, message, reasoning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind_case_insensitive() {
        assert_eq!(ActionKind::parse("Search"), Some(ActionKind::Search));
        assert_eq!(ActionKind::parse(" CREATE "), Some(ActionKind::Create));
        assert_eq!(ActionKind::parse("delete"), None);
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ActionKind::Analyze).unwrap();
        assert_eq!(json, "\"analyze\"");
    }

    #[test]
    fn test_failure_is_respond() {
        let action = Action::failure("Error: boom", "edit failed");
        assert_eq!(action.kind, ActionKind::Respond);
        assert_eq!(action.content.as_deref(), Some("Error: boom"));
        assert!(action.target.is_none());
    }
}
