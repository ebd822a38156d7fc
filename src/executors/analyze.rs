//! Analyze 执行器：读取目标文件，让 LLM 解释 / 审查，原样返回分析结果（不修改文件）

use async_trait::async_trait;

use crate::core::{Action, ActionKind, AgentError, Request};
use crate::executors::{resolve_target, ActionExecutor, ExecutorContext};
use crate::host::{with_progress, NotifyLevel};

pub fn build_analyze_prompt(question: &str, path: &str, content: &str) -> String {
    format!(
        "Analyze the file `{path}` and answer the request below.\n\n\
Request:\n{question}\n\n\
File content:\n{content}"
    )
}

pub struct AnalyzeExecutor {
    ctx: ExecutorContext,
}

impl AnalyzeExecutor {
    pub fn new(ctx: ExecutorContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ActionExecutor for AnalyzeExecutor {
    fn kind(&self) -> ActionKind {
        ActionKind::Analyze
    }

    fn context(&self) -> &ExecutorContext {
        &self.ctx
    }

    async fn run(&self, request: &Request, action: &Action) -> Result<Action, AgentError> {
        let target = resolve_target(&self.ctx, "analyze").await?;
        let content = self.ctx.files.read(&target).await?;

        let analysis = with_progress(
            self.ctx.ui.as_ref(),
            &format!("Analyzing {target}"),
            self.ctx.llm.complete(
                &build_analyze_prompt(request.prompt(), &target, &content),
                request.context(),
            ),
        )
        .await?;
        if analysis.trim().is_empty() {
            return Err(AgentError::EmptyGeneration);
        }

        self.ctx
            .ui
            .notify(&format!("Analysis of {target} ready"), NotifyLevel::Info)
            .await;
        Ok(Action::executed(
            ActionKind::Analyze,
            Some(target),
            analysis,
            action.reasoning.clone(),
        ))
    }
}
