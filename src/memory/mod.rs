//! 记忆层：对话历史（短期），为请求提供上下文片段

pub mod conversation;

pub use conversation::{ConversationMemory, Message, Role};
