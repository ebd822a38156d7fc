//! 核心层：请求/动作/响应模型、会话状态、错误类型、编排器

pub mod action;
pub mod error;
pub mod orchestrator;
pub mod request;
pub mod state;

pub use action::{Action, ActionKind};
pub use error::AgentError;
pub use orchestrator::{create_llm_from_config, Agent, AgentSettings};
pub use request::{Request, Response};
pub use state::{InactivePolicy, SessionState};
