//! 脚本化 UI（测试与嵌入用）
//!
//! 选择框与输入框的回答预先排队；队列为空时视为用户取消。记录所有通知、选择请求与进度标题。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::host::{NotifyLevel, PickOptions, PromptOptions, UiCapability};

#[derive(Debug, Default)]
pub struct ScriptedUi {
    picks: Mutex<VecDeque<Option<String>>>,
    texts: Mutex<VecDeque<Option<String>>>,
    notifications: Mutex<Vec<(NotifyLevel, String)>>,
    pick_requests: Mutex<Vec<Vec<String>>>,
    progress: Mutex<Vec<String>>,
}

impl ScriptedUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// 下一次 pick_one 选择该项（None 表示取消）
    pub fn pick(self, item: Option<&str>) -> Self {
        if let Ok(mut p) = self.picks.lock() {
            p.push_back(item.map(String::from));
        }
        self
    }

    /// 下一次 prompt_text 输入该文本（None 表示取消）
    pub fn text(self, value: Option<&str>) -> Self {
        if let Ok(mut t) = self.texts.lock() {
            t.push_back(value.map(String::from));
        }
        self
    }

    pub fn notifications(&self) -> Vec<(NotifyLevel, String)> {
        self.notifications
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    /// 每次 pick_one 收到的候选项
    pub fn pick_requests(&self) -> Vec<Vec<String>> {
        self.pick_requests
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn progress_titles(&self) -> Vec<String> {
        self.progress.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl UiCapability for ScriptedUi {
    async fn notify(&self, message: &str, level: NotifyLevel) {
        if let Ok(mut n) = self.notifications.lock() {
            n.push((level, message.to_string()));
        }
    }

    async fn pick_one(&self, items: &[String], _options: &PickOptions) -> Option<String> {
        if let Ok(mut r) = self.pick_requests.lock() {
            r.push(items.to_vec());
        }
        self.picks.lock().ok().and_then(|mut p| p.pop_front()).flatten()
    }

    async fn prompt_text(&self, _options: &PromptOptions) -> Option<String> {
        self.texts.lock().ok().and_then(|mut t| t.pop_front()).flatten()
    }

    async fn progress_start(&self, title: &str) {
        if let Ok(mut p) = self.progress.lock() {
            p.push(title.to_string());
        }
    }
}
