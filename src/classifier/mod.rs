//! 动作分类器
//!
//! 先让 LLM 按 JSON Schema 回复 `{"type": ..., "reasoning": ...}`；调用失败、超时、JSON 非法或
//! 类型未知时回退到 keywords::classify_by_keywords。determine 永不失败。

pub mod keywords;

use schemars::{schema_for, JsonSchema};
use serde::Deserialize;

use crate::core::{Action, ActionKind, AgentError, Request};
use crate::llm::BoundedLlm;

pub use keywords::{classify_by_keywords, create_indicator};

/// 分类回复格式（也用于生成注入 prompt 的 JSON Schema）
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClassificationReply {
    /// 动作类型：search / edit / create / analyze / respond（忽略大小写与首尾空白）
    #[serde(rename = "type")]
    #[schemars(with = "Option<ActionKind>")]
    pub kind: Option<String>,
    /// 选择该动作的简短理由
    pub reasoning: Option<String>,
}

/// 返回分类回复的 JSON Schema 字符串，可拼入 prompt
pub fn classification_schema_json() -> String {
    let schema = schema_for!(ClassificationReply);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// 构建分类 prompt：动作菜单 + 用户原文 + 回复 Schema
pub fn build_classification_prompt(user_prompt: &str) -> String {
    let menu = ActionKind::ALL
        .iter()
        .map(|k| format!("- {}: {}", k.as_str(), k.description()))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are the action router of a code editor assistant. \
Pick the single action that best serves the user's request.\n\n\
Available actions:\n{menu}\n\n\
User request:\n\"\"\"\n{user_prompt}\n\"\"\"\n\n\
Reply with ONLY a JSON object (no markdown, no extra text) matching this JSON Schema:\n{schema}\n\n\
Example: {{\"type\": \"edit\", \"reasoning\": \
\"The user wants to fix a bug in an existing file.\"}}",
        schema = classification_schema_json(),
    )
}

/// 从文本中取出 JSON：```json 围栏内的内容，否则最外层 {...}
fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        return Some(
            rest.find("```")
                .map(|end| rest[..end].trim())
                .unwrap_or(rest.trim()),
        );
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (end > start).then(|| &trimmed[start..=end])
}

/// 解析 LLM 分类回复；缺 type 视为 Respond，缺 reasoning 使用默认理由
pub fn parse_classification(text: &str) -> Result<Action, AgentError> {
    let json = extract_json(text)
        .ok_or_else(|| AgentError::ClassificationParse(format!("no JSON object in: {text}")))?;
    let reply: ClassificationReply = serde_json::from_str(json)
        .map_err(|e| AgentError::ClassificationParse(format!("{e}: {json}")))?;
    let kind = match reply.kind.as_deref() {
        None => ActionKind::Respond,
        Some(name) => ActionKind::parse(name).ok_or_else(|| {
            AgentError::ClassificationParse(format!("unknown action type: {name}"))
        })?,
    };
    let reasoning = reply
        .reasoning
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| format!("Classified as {kind}"));
    Ok(Action::classified(kind, reasoning))
}

/// 动作分类器：LLM 优先，关键词兜底
#[derive(Clone)]
pub struct ActionClassifier {
    llm: BoundedLlm,
}

impl ActionClassifier {
    pub fn new(llm: BoundedLlm) -> Self {
        Self { llm }
    }

    pub async fn determine(&self, request: &Request) -> Action {
        let prompt = build_classification_prompt(request.prompt());
        let parsed = match self.llm.complete(&prompt, request.context()).await {
            Ok(reply) => parse_classification(&reply),
            Err(e) => Err(e),
        };
        match parsed {
            Ok(action) => {
                tracing::info!(kind = %action.kind, "classified by llm");
                action
            }
            Err(e) => {
                let action = classify_by_keywords(request.prompt());
                tracing::warn!(
                    error = %e,
                    kind = %action.kind,
                    "llm classification failed, using keyword fallback"
                );
                action
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::llm::ScriptedLlmClient;

    fn classifier(llm: ScriptedLlmClient) -> ActionClassifier {
        ActionClassifier::new(BoundedLlm::new(
            Arc::new(llm),
            Duration::from_millis(100),
            Duration::from_millis(100),
        ))
    }

    #[test]
    fn test_parse_plain_json() {
        let action =
            parse_classification(r#"{"type": "analyze", "reasoning": "wants a review"}"#).unwrap();
        assert_eq!(action.kind, ActionKind::Analyze);
        assert_eq!(action.reasoning, "wants a review");
    }

    #[test]
    fn test_parse_fenced_json_with_missing_fields() {
        let action = parse_classification("Sure!\n```json\n{}\n```").unwrap();
        assert_eq!(action.kind, ActionKind::Respond);
        assert_eq!(action.reasoning, "Classified as respond");
    }

    #[test]
    fn test_parse_kind_ignores_case_and_padding() {
        let edit = parse_classification(r#"{"type": "Edit", "reasoning": "fix"}"#).unwrap();
        assert_eq!(edit.kind, ActionKind::Edit);
        let search = parse_classification(r#"{"type": " SEARCH "}"#).unwrap();
        assert_eq!(search.kind, ActionKind::Search);
        assert_eq!(search.reasoning, "Classified as search");
    }

    #[tokio::test]
    async fn test_capitalized_llm_kind_is_not_overridden_by_keywords() {
        let c = classifier(ScriptedLlmClient::new().reply(r#"{"type":"Edit","reasoning":"fix"}"#));
        let req = Request::new("find the bug and fix it").unwrap();
        let action = c.determine(&req).await;
        assert_eq!(action.kind, ActionKind::Edit);
        assert_eq!(action.reasoning, "fix");
    }

    #[test]
    fn test_parse_unknown_kind_fails() {
        let err = parse_classification(r#"{"type": "delete"}"#).unwrap_err();
        assert!(matches!(err, AgentError::ClassificationParse(_)));
    }

    #[test]
    fn test_prompt_contains_menu_and_schema() {
        let prompt = build_classification_prompt("rename foo");
        for kind in ActionKind::ALL {
            assert!(prompt.contains(&format!("- {}:", kind.as_str())));
        }
        assert!(prompt.contains("rename foo"));
        assert!(prompt.contains("\"reasoning\""));
    }

    #[tokio::test]
    async fn test_llm_result_is_used() {
        let c = classifier(
            ScriptedLlmClient::new().reply(r#"{"type":"search","reasoning":"lookup"}"#),
        );
        let req = Request::new("where is the login form").unwrap();
        let action = c.determine(&req).await;
        assert_eq!(action.kind, ActionKind::Search);
        assert_eq!(action.reasoning, "lookup");
    }

    #[tokio::test]
    async fn test_garbage_reply_falls_back_to_keywords() {
        let c = classifier(ScriptedLlmClient::new().reply("I think you want to create something"));
        let req = Request::new("create a new file called foo.ts").unwrap();
        let action = c.determine(&req).await;
        assert_eq!(action.kind, ActionKind::Create);
        assert!(action.reasoning.starts_with("Keyword fallback"));
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back_to_keywords() {
        let c = classifier(ScriptedLlmClient::new().fail("connection refused"));
        let req = Request::new("find all usages of login").unwrap();
        assert_eq!(c.determine(&req).await.kind, ActionKind::Search);
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_keywords() {
        let slow = ScriptedLlmClient::new()
            .always(r#"{"type":"respond"}"#)
            .with_delay(Duration::from_millis(500));
        let c = classifier(slow);
        let req = Request::new("explain the parser").unwrap();
        assert_eq!(c.determine(&req).await.kind, ActionKind::Analyze);
    }
}
