//! 内存工作区（测试与嵌入用）
//!
//! 文件保存在 BTreeMap 中，记录每次 write / open，便于断言执行器是否触碰了文件。

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use regex::RegexBuilder;

use crate::core::AgentError;
use crate::host::{EditorHandle, FileCapability, LineMatch, SearchHit};

#[derive(Debug)]
pub struct InMemoryWorkspace {
    root: PathBuf,
    files: Mutex<BTreeMap<String, String>>,
    active: Mutex<Option<String>>,
    writes: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
    fail_open: bool,
}

impl Default for InMemoryWorkspace {
    fn default() -> Self {
        Self::new("/workspace")
    }
}

impl InMemoryWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: Mutex::new(BTreeMap::new()),
            active: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
            fail_open: false,
        }
    }

    /// 预置文件（不计入 writes）
    pub fn with_file(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.into(), content.into());
        }
        self
    }

    pub fn with_active(self, path: impl Into<String>) -> Self {
        if let Ok(mut active) = self.active.lock() {
            *active = Some(path.into());
        }
        self
    }

    /// 无工作区根目录（模拟未打开文件夹）
    pub fn without_root(mut self) -> Self {
        self.root = PathBuf::new();
        self
    }

    /// open 一律失败（模拟编辑器拒绝打开）
    pub fn with_failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.files.lock().ok().and_then(|f| f.get(path).cloned())
    }

    /// 已写入的路径（按顺序）
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// 已打开的路径（按顺序）
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl FileCapability for InMemoryWorkspace {
    async fn read(&self, path: &str) -> Result<String, AgentError> {
        self.file(path)
            .ok_or_else(|| AgentError::FileIo(format!("File not found: {path}")))
    }

    async fn write(&self, path: &str, content: &str) -> Result<(), AgentError> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| AgentError::FileIo("workspace lock poisoned".to_string()))?;
        files.insert(path.to_string(), content.to_string());
        if let Ok(mut w) = self.writes.lock() {
            w.push(path.to_string());
        }
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        self.file(path).is_some()
    }

    async fn list_workspace_files(&self) -> Result<Vec<String>, AgentError> {
        Ok(self
            .files
            .lock()
            .map(|f| f.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn search_content(&self, pattern: &str) -> Result<Vec<SearchHit>, AgentError> {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| AgentError::FileIo(format!("Invalid search pattern: {e}")))?;
        let files = self
            .files
            .lock()
            .map_err(|_| AgentError::FileIo("workspace lock poisoned".to_string()))?;
        Ok(files
            .iter()
            .filter_map(|(path, content)| {
                let matches: Vec<LineMatch> = content
                    .lines()
                    .enumerate()
                    .filter(|(_, l)| re.is_match(l))
                    .map(|(i, l)| LineMatch {
                        line: i + 1,
                        text: l.to_string(),
                    })
                    .collect();
                (!matches.is_empty()).then(|| SearchHit {
                    path: path.clone(),
                    matches,
                })
            })
            .collect())
    }

    async fn open(&self, path: &str) -> Result<EditorHandle, AgentError> {
        if self.fail_open {
            return Err(AgentError::FileIo(format!("Editor refused to open {path}")));
        }
        if self.file(path).is_none() {
            return Err(AgentError::NoTarget(format!("File not found: {path}")));
        }
        if let Ok(mut o) = self.opened.lock() {
            o.push(path.to_string());
        }
        Ok(EditorHandle {
            path: path.to_string(),
        })
    }

    async fn active_document(&self) -> Option<String> {
        self.active.lock().ok().and_then(|a| a.clone())
    }

    fn workspace_roots(&self) -> Vec<PathBuf> {
        if self.root.as_os_str().is_empty() {
            Vec::new()
        } else {
            vec![self.root.clone()]
        }
    }
}
