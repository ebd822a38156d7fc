//! Create 执行器：生成代码、推断文件名、写入第一个工作区根目录并打开

use std::path::Path;

use async_trait::async_trait;

use crate::core::{Action, ActionKind, AgentError, Request};
use crate::executors::naming::{derive_file_name, with_suffix};
use crate::executors::{strip_code_fence, ActionExecutor, ExecutorContext};
use crate::host::{with_progress, FileCapability, NotifyLevel};

/// 同名文件存在时最多尝试的后缀数
const MAX_SUFFIX: usize = 100;

pub fn build_create_prompt(instruction: &str) -> String {
    format!(
        "Generate the code for the following request:\n{instruction}\n\n\
Return ONLY the file content, without markdown code fences or explanations. \
If a specific file name fits, put it in a comment on the first line, e.g. `// src/utils.ts`."
    )
}

/// 根目录下不冲突的路径：name、name-1、name-2 ...
async fn unique_path(
    files: &dyn FileCapability,
    root: &Path,
    name: &str,
) -> Result<String, AgentError> {
    let candidate = root.join(name).to_string_lossy().to_string();
    if !files.exists(&candidate).await {
        return Ok(candidate);
    }
    for n in 1..=MAX_SUFFIX {
        let candidate = root.join(with_suffix(name, n)).to_string_lossy().to_string();
        if !files.exists(&candidate).await {
            return Ok(candidate);
        }
    }
    Err(AgentError::FileIo(format!(
        "Could not find a free file name for {name}"
    )))
}

pub struct CreateExecutor {
    ctx: ExecutorContext,
}

impl CreateExecutor {
    pub fn new(ctx: ExecutorContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ActionExecutor for CreateExecutor {
    fn kind(&self) -> ActionKind {
        ActionKind::Create
    }

    fn context(&self) -> &ExecutorContext {
        &self.ctx
    }

    async fn run(&self, request: &Request, action: &Action) -> Result<Action, AgentError> {
        let root = self
            .ctx
            .files
            .workspace_roots()
            .into_iter()
            .next()
            .ok_or(AgentError::NoWorkspace)?;

        let generated = with_progress(
            self.ctx.ui.as_ref(),
            "Generating code",
            self.ctx
                .llm
                .complete(&build_create_prompt(request.prompt()), request.context()),
        )
        .await?;

        let cleaned = strip_code_fence(&generated);
        if cleaned.trim().is_empty() {
            return Err(AgentError::EmptyGeneration);
        }

        let name = derive_file_name(request.prompt(), &cleaned);
        let path = unique_path(self.ctx.files.as_ref(), &root, &name).await?;
        tracing::info!(path = %path, derived = %name, "creating file");

        self.ctx.files.write(&path, &cleaned).await?;
        match self.ctx.files.open(&path).await {
            Ok(_) => {
                self.ctx
                    .ui
                    .notify(&format!("Created {path}"), NotifyLevel::Info)
                    .await
            }
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "created file could not be opened");
                self.ctx
                    .ui
                    .notify(
                        &format!("Created {path} but could not open it: {e}"),
                        NotifyLevel::Warning,
                    )
                    .await
            }
        }

        Ok(Action::executed(
            ActionKind::Create,
            Some(path),
            cleaned,
            action.reasoning.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::host::{InMemoryWorkspace, ScriptedUi};
    use crate::llm::{BoundedLlm, ScriptedLlmClient};

    fn exec(llm: ScriptedLlmClient, files: Arc<InMemoryWorkspace>) -> CreateExecutor {
        exec_with_ui(llm, files, Arc::new(ScriptedUi::new()))
    }

    fn exec_with_ui(
        llm: ScriptedLlmClient,
        files: Arc<InMemoryWorkspace>,
        ui: Arc<ScriptedUi>,
    ) -> CreateExecutor {
        CreateExecutor::new(ExecutorContext {
            llm: BoundedLlm::new(
                Arc::new(llm),
                Duration::from_secs(1),
                Duration::from_secs(1),
            ),
            files,
            ui,
            picker_limit: 20,
            open_first_match: true,
        })
    }

    fn classified() -> Action {
        Action::classified(ActionKind::Create, "new file")
    }

    #[tokio::test]
    async fn test_creates_file_from_fenced_output() {
        let files = Arc::new(InMemoryWorkspace::default());
        let llm = ScriptedLlmClient::new().reply("```js\nconsole.log(1)\n```");
        let req = Request::new("create a new file called hello.js").unwrap();
        let action = exec(llm, files.clone()).execute(&req, &classified()).await;

        assert_eq!(action.kind, ActionKind::Create);
        assert_eq!(action.target.as_deref(), Some("/workspace/hello.js"));
        assert_eq!(action.content.as_deref(), Some("console.log(1)"));
        assert_eq!(files.file("/workspace/hello.js").as_deref(), Some("console.log(1)"));
        assert_eq!(files.opened(), vec!["/workspace/hello.js"]);
    }

    #[tokio::test]
    async fn test_existing_name_gets_suffix() {
        let files =
            Arc::new(InMemoryWorkspace::default().with_file("/workspace/styles.css", "a{}"));
        let llm = ScriptedLlmClient::new().reply(".btn {\n  color: red;\n}");
        let req = Request::new("add some css for buttons").unwrap();
        let action = exec(llm, files.clone()).execute(&req, &classified()).await;

        assert_eq!(action.target.as_deref(), Some("/workspace/styles-1.css"));
        assert_eq!(files.file("/workspace/styles.css").as_deref(), Some("a{}"));
    }

    #[tokio::test]
    async fn test_no_workspace_is_respond_without_llm_call() {
        let files = Arc::new(InMemoryWorkspace::default().without_root());
        let llm = ScriptedLlmClient::new().reply("x");
        let req = Request::new("create a script").unwrap();
        let action = exec(llm, files.clone()).execute(&req, &classified()).await;

        assert_eq!(action.kind, ActionKind::Respond);
        assert!(action.content.unwrap().contains("No workspace"));
        assert!(files.writes().is_empty());
    }

    #[tokio::test]
    async fn test_empty_generation_is_respond() {
        let files = Arc::new(InMemoryWorkspace::default());
        let req = Request::new("create a module").unwrap();
        let action = exec(ScriptedLlmClient::new().reply("   "), files.clone())
            .execute(&req, &classified())
            .await;
        assert_eq!(action.kind, ActionKind::Respond);
        assert!(files.writes().is_empty());
    }

    #[tokio::test]
    async fn test_open_failure_after_write_still_reports_create() {
        let files = Arc::new(InMemoryWorkspace::default().with_failing_open());
        let ui = Arc::new(ScriptedUi::new());
        let llm = ScriptedLlmClient::new().reply("console.log(1)");
        let req = Request::new("create a new file called hello.js").unwrap();
        let action = exec_with_ui(llm, files.clone(), ui.clone())
            .execute(&req, &classified())
            .await;

        assert_eq!(action.kind, ActionKind::Create);
        assert_eq!(action.target.as_deref(), Some("/workspace/hello.js"));
        assert_eq!(files.file("/workspace/hello.js").as_deref(), Some("console.log(1)"));
        assert!(files.opened().is_empty());
        let notes = ui.notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].0, NotifyLevel::Warning);
        assert!(notes[0].1.contains("could not open"));
    }
}
