//! 会话状态：active 标志与当前任务
//!
//! 由 Agent 独占持有并修改；外部只能拿到快照。

use serde::{Deserialize, Serialize};

/// 会话状态快照
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub active: bool,
    /// 正在处理的请求 prompt；分发结束（成功或失败）后清空
    pub current_task: Option<String>,
}

impl SessionState {
    pub fn start(&mut self) {
        self.active = true;
    }

    /// 停止会话并清空当前任务
    pub fn stop(&mut self) {
        self.active = false;
        self.current_task = None;
    }

    pub fn begin_task(&mut self, prompt: &str) {
        self.current_task = Some(prompt.to_string());
    }

    pub fn end_task(&mut self) {
        self.current_task = None;
    }
}

/// 会话未激活时 process_request 的处理策略
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InactivePolicy {
    /// 直接返回 "Error: agent is not active" 的 Respond 响应，不调用分类器
    #[default]
    Reject,
    /// 照常处理
    Process,
}
