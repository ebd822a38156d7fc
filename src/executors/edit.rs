//! Edit 执行器：让 LLM 返回修改后的完整文件并覆盖写回
//!
//! 目标文件取活动文档或用户选择；去围栏后为空则视为失败，不触碰文件。

use async_trait::async_trait;

use crate::core::{Action, ActionKind, AgentError, Request};
use crate::executors::{resolve_target, strip_code_fence, ActionExecutor, ExecutorContext};
use crate::host::{with_progress, NotifyLevel};

pub fn build_edit_prompt(instruction: &str, path: &str, content: &str) -> String {
    format!(
        "You are editing the file `{path}`.\n\n\
Instruction:\n{instruction}\n\n\
Current content:\n{content}\n\n\
Return the COMPLETE modified file content and nothing else. \
Do not wrap it in markdown code fences and do not add explanations."
    )
}

pub struct EditExecutor {
    ctx: ExecutorContext,
}

impl EditExecutor {
    pub fn new(ctx: ExecutorContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ActionExecutor for EditExecutor {
    fn kind(&self) -> ActionKind {
        ActionKind::Edit
    }

    fn context(&self) -> &ExecutorContext {
        &self.ctx
    }

    async fn run(&self, request: &Request, action: &Action) -> Result<Action, AgentError> {
        let target = resolve_target(&self.ctx, "edit").await?;
        let original = self.ctx.files.read(&target).await?;

        let prompt = build_edit_prompt(request.prompt(), &target, &original);
        let generated = with_progress(
            self.ctx.ui.as_ref(),
            &format!("Editing {target}"),
            self.ctx.llm.complete(&prompt, request.context()),
        )
        .await?;

        let cleaned = strip_code_fence(&generated);
        if cleaned.trim().is_empty() {
            return Err(AgentError::EmptyGeneration);
        }

        self.ctx.files.write(&target, &cleaned).await?;
        match self.ctx.files.open(&target).await {
            Ok(_) => {
                self.ctx
                    .ui
                    .notify(&format!("Updated {target}"), NotifyLevel::Info)
                    .await
            }
            Err(e) => {
                tracing::warn!(path = %target, error = %e, "edited file could not be opened");
                self.ctx
                    .ui
                    .notify(
                        &format!("Updated {target} but could not open it: {e}"),
                        NotifyLevel::Warning,
                    )
                    .await
            }
        }

        Ok(Action::executed(
            ActionKind::Edit,
            Some(target),
            cleaned,
            action.reasoning.clone(),
        ))
    }
}
