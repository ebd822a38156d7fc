//! Respond 执行器：直接回答，没有文件副作用

use async_trait::async_trait;

use crate::core::{Action, ActionKind, AgentError, Request};
use crate::executors::{ActionExecutor, ExecutorContext};

pub struct RespondExecutor {
    ctx: ExecutorContext,
}

impl RespondExecutor {
    pub fn new(ctx: ExecutorContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ActionExecutor for RespondExecutor {
    fn kind(&self) -> ActionKind {
        ActionKind::Respond
    }

    fn context(&self) -> &ExecutorContext {
        &self.ctx
    }

    async fn run(&self, request: &Request, action: &Action) -> Result<Action, AgentError> {
        let answer = self
            .ctx
            .llm
            .complete(request.prompt(), request.context())
            .await?;
        Ok(Action::executed(
            ActionKind::Respond,
            None,
            answer,
            action.reasoning.clone(),
        ))
    }
}
