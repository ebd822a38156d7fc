//! 本地目录工作区
//!
//! 绑定 root_dir，所有路径必须落在根目录内（禁止 ../ 逃逸）；
//! 遍历跳过隐藏文件与 exclude glob，搜索按行匹配正则并限制文件大小与结果数。

use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use regex::RegexBuilder;
use walkdir::WalkDir;

use crate::config::WorkspaceSection;
use crate::core::AgentError;
use crate::host::{EditorHandle, FileCapability, LineMatch, SearchHit};

/// 本地工作区：文件能力的文件系统实现
#[derive(Debug)]
pub struct LocalWorkspace {
    root_dir: PathBuf,
    exclude: Vec<glob::Pattern>,
    max_file_size: u64,
    max_search_results: usize,
    active: RwLock<Option<String>>,
}

impl LocalWorkspace {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        Self::with_settings(root_dir, &WorkspaceSection::default())
    }

    pub fn with_settings(root_dir: impl AsRef<Path>, settings: &WorkspaceSection) -> Self {
        let root = root_dir.as_ref().to_path_buf();
        let root_dir = root.canonicalize().unwrap_or(root);
        let exclude = settings
            .exclude
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!(pattern = %p, error = %e, "Ignoring invalid exclude pattern");
                    None
                }
            })
            .collect();
        Self {
            root_dir,
            exclude,
            max_file_size: settings.max_file_size,
            max_search_results: settings.max_search_results,
            active: RwLock::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// 设置活动文档（相当于用户在编辑器中切换了标签页）
    pub fn set_active_document(&self, path: Option<String>) {
        if let Ok(mut active) = self.active.write() {
            *active = path;
        }
    }

    /// 解析为根目录下的绝对路径；含 `..` 或落在根外的路径视为逃逸
    pub fn resolve(&self, path: &str) -> Result<PathBuf, AgentError> {
        let p = Path::new(path.trim_start_matches("./"));
        if p.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(AgentError::PathEscape(path.to_string()));
        }
        let full = if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root_dir.join(p)
        };
        if full.starts_with(&self.root_dir) {
            Ok(full)
        } else {
            Err(AgentError::PathEscape(path.to_string()))
        }
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn is_excluded(&self, name: &str, relative: &str) -> bool {
        name.starts_with('.')
            || self
                .exclude
                .iter()
                .any(|p| p.matches(name) || p.matches(relative))
    }

    /// 遍历工作区文件（相对路径，按名称排序）
    fn walk_files(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.root_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !self.is_excluded(&name, &self.relative(e.path()))
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    }
}

#[async_trait]
impl FileCapability for LocalWorkspace {
    async fn read(&self, path: &str) -> Result<String, AgentError> {
        let resolved = self.resolve(path)?;
        tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|e| AgentError::FileIo(format!("Read {path} failed: {e}")))
    }

    async fn write(&self, path: &str, content: &str) -> Result<(), AgentError> {
        let resolved = self.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AgentError::FileIo(format!("Failed to create parent directory: {e}"))
            })?;
        }
        tokio::fs::write(&resolved, content)
            .await
            .map_err(|e| AgentError::FileIo(format!("Write {path} failed: {e}")))?;
        tracing::info!(path = %path, bytes = content.len(), "workspace write");
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(p) => tokio::fs::metadata(p).await.is_ok(),
            Err(_) => false,
        }
    }

    async fn list_workspace_files(&self) -> Result<Vec<String>, AgentError> {
        Ok(self
            .walk_files()
            .iter()
            .map(|p| self.relative(p))
            .collect())
    }

    async fn search_content(&self, pattern: &str) -> Result<Vec<SearchHit>, AgentError> {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .or_else(|_| {
                RegexBuilder::new(&regex::escape(pattern))
                    .case_insensitive(true)
                    .build()
            })
            .map_err(|e| AgentError::FileIo(format!("Invalid search pattern: {e}")))?;

        let mut hits = Vec::new();
        for path in self.walk_files() {
            if hits.len() >= self.max_search_results {
                break;
            }
            if let Ok(meta) = std::fs::metadata(&path) {
                if meta.len() > self.max_file_size {
                    continue;
                }
            }
            // 跳过二进制或非 UTF-8 文件
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            let matches: Vec<LineMatch> = content
                .lines()
                .enumerate()
                .filter(|(_, line)| re.is_match(line))
                .map(|(i, line)| LineMatch {
                    line: i + 1,
                    text: line.to_string(),
                })
                .collect();
            if !matches.is_empty() {
                hits.push(SearchHit {
                    path: self.relative(&path),
                    matches,
                });
            }
        }
        Ok(hits)
    }

    async fn open(&self, path: &str) -> Result<EditorHandle, AgentError> {
        let resolved = self.resolve(path)?;
        if !resolved.is_file() {
            return Err(AgentError::NoTarget(format!("File not found: {path}")));
        }
        let relative = self.relative(&resolved);
        self.set_active_document(Some(relative.clone()));
        tracing::info!(path = %relative, "open document");
        Ok(EditorHandle { path: relative })
    }

    async fn active_document(&self) -> Option<String> {
        self.active.read().ok().and_then(|a| a.clone())
    }

    fn workspace_roots(&self) -> Vec<PathBuf> {
        vec![self.root_dir.clone()]
    }
}
