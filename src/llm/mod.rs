//! LLM 层：能力抽象、超时包装与实现（OpenAI 兼容 / DeepSeek / Mock）

pub mod bounded;
pub mod mock;
pub mod openai;
pub mod traits;

pub use bounded::{BoundedLlm, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use mock::{MockLlmClient, ScriptedLlmClient};
pub use openai::{OpenAiClient, DEEPSEEK_BASE_URL, DEEPSEEK_CHAT};
pub use traits::{build_messages, LlmClient, LlmError, TokenStream};
