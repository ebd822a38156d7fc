//! Agent 错误类型
//!
//! 分类阶段的错误（ClassificationParse / LlmTimeout）由分类器本地回退到关键词匹配；
//! 执行阶段的错误由执行器转为 Respond 动作；二者都不会越过 Agent 边界。

use thiserror::Error;

use crate::llm::LlmError;

/// Agent 运行过程中可能出现的错误（分类解析、LLM、文件、用户取消、路径逃逸等）
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Classification parse error: {0}")]
    ClassificationParse(String),

    #[error("LLM request timed out after {0}s")]
    LlmTimeout(u64),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("File operation failed: {0}")]
    FileIo(String),

    /// 模型输出在去除代码围栏后为空
    #[error("Model returned empty content")]
    EmptyGeneration,

    /// 用户关闭了选择框或输入框
    #[error("Cancelled by user: {0}")]
    Cancelled(String),

    #[error("No target file: {0}")]
    NoTarget(String),

    #[error("No workspace folder is open")]
    NoWorkspace,

    #[error("Path escape attempt: {0}")]
    PathEscape(String),

    #[error("Request prompt must not be empty")]
    EmptyPrompt,

    #[error("agent is not active")]
    Inactive,

    #[error("Config error: {0}")]
    Config(String),
}

impl From<std::io::Error> for AgentError {
    fn from(e: std::io::Error) -> Self {
        AgentError::FileIo(e.to_string())
    }
}
