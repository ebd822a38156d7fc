//! Codepilot - 编辑器内的编码助手核心
//!
//! 把自然语言请求分类为 搜索 / 编辑 / 创建 / 分析 / 回复 五种动作之一，并通过注入的宿主能力执行。
//!
//! 模块划分：
//! - **classifier**: 动作分类（LLM JSON 回复 + 关键词兜底）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 请求 / 动作 / 响应模型、会话状态、错误类型、Agent 编排器
//! - **events**: 供展示层使用的对话与流式事件
//! - **executors**: 五种动作的执行器
//! - **host**: 文件能力与 UI 能力抽象及实现（本地目录、内存、终端、脚本化）
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）与超时包装
//! - **memory**: 对话历史
//! - **observability**: 日志初始化

pub mod classifier;
pub mod config;
pub mod core;
pub mod events;
pub mod executors;
pub mod host;
pub mod llm;
pub mod memory;
pub mod observability;

pub use crate::core::{Action, ActionKind, Agent, AgentError, AgentSettings, Request, Response};
