//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `CODEPILOT__*` 覆盖（双下划线表示嵌套，如 `CODEPILOT__AGENT__PICKER_LIMIT=50`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::InactivePolicy;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "CODEPILOT";

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub agent: AgentSection,
    pub workspace: WorkspaceSection,
}

/// [app] 段：应用名、工作目录
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 工作区根目录，未设置时用当前目录
    pub workspace_root: Option<PathBuf>,
}

/// [llm] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：deepseek / openai；最终选择由 API Key 与 provider 共同决定
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub deepseek: ModelOverride,
    pub openai: ModelOverride,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "deepseek".to_string(),
            model: "deepseek-chat".to_string(),
            base_url: None,
            deepseek: ModelOverride::default(),
            openai: ModelOverride::default(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelOverride {
    pub model: Option<String>,
}

/// [llm.timeouts] 段（秒）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    pub request: u64,
    pub stream: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: 30,
            stream: 120,
        }
    }
}

/// [agent] 段：会话策略与执行器参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// 会话未激活时的处理：reject / process
    pub inactive_policy: InactivePolicy,
    /// Edit / Analyze 选择文件时最多列出的文件数
    pub picker_limit: usize,
    /// 搜索后是否打开第一个匹配文件
    pub open_first_match: bool,
    /// REPL 作为上下文传给请求的对话轮数
    pub max_context_turns: usize,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            inactive_policy: InactivePolicy::Reject,
            picker_limit: 20,
            open_first_match: true,
            max_context_turns: 10,
        }
    }
}

/// [workspace] 段：本地工作区遍历与搜索限制
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkspaceSection {
    /// 跳过的文件 / 目录（glob，匹配名称或相对路径）
    pub exclude: Vec<String>,
    /// 大于该字节数的文件不参与搜索
    pub max_file_size: u64,
    /// 搜索最多返回的文件数
    pub max_search_results: usize,
}

impl Default for WorkspaceSection {
    fn default() -> Self {
        Self {
            exclude: vec![
                "node_modules".into(),
                "target".into(),
                "dist".into(),
                "out".into(),
                "*.lock".into(),
            ],
            max_file_size: 1024 * 1024,
            max_search_results: 50,
        }
    }
}

/// 从 config 目录加载配置，环境变量 CODEPILOT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 CODEPILOT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    for name in ["config/default", "../config/default", "default"] {
        if std::path::Path::new(&format!("{name}.toml")).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(path) = config_path.filter(|p| p.exists()) {
        builder = builder.add_source(config::File::from(path).required(false));
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.agent.picker_limit, 20);
        assert_eq!(cfg.agent.inactive_policy, InactivePolicy::Reject);
        assert_eq!(cfg.llm.timeouts.request, 30);
        assert!(cfg.workspace.exclude.iter().any(|e| e == "node_modules"));
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[agent]\npicker_limit = 5\ninactive_policy = \"process\"\n\n\
             [llm.timeouts]\nrequest = 10\n",
        )
        .unwrap();
        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.agent.picker_limit, 5);
        assert_eq!(cfg.agent.inactive_policy, InactivePolicy::Process);
        assert_eq!(cfg.llm.timeouts.request, 10);
        // 未写的键保持默认
        assert_eq!(cfg.llm.timeouts.stream, 120);
        assert!(cfg.agent.open_first_match);
    }

    #[test]
    fn test_env_overrides_file() {
        std::env::set_var("CODEPILOT__WORKSPACE__MAX_SEARCH_RESULTS", "7");
        let cfg = load_config(None).unwrap();
        std::env::remove_var("CODEPILOT__WORKSPACE__MAX_SEARCH_RESULTS");
        assert_eq!(cfg.workspace.max_search_results, 7);
    }
}
