//! Agent 编排器
//!
//! 持有会话状态、分类器与全部执行器；process_request 完成 分类 -> 分发 -> 组装响应，
//! 任何失败（包括 panic）都转为 Respond 响应，永不向调用方返回错误。

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::classifier::ActionClassifier;
use crate::config::AppConfig;
use crate::core::{Action, ActionKind, InactivePolicy, Request, Response, SessionState};
use crate::events::{AgentEvent, ChatMessage};
use crate::executors::{ExecutorContext, Executors};
use crate::host::{FileCapability, NotifyLevel, UiCapability};
use crate::llm::{BoundedLlm, LlmClient, MockLlmClient, OpenAiClient};

/// Agent 运行参数
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub inactive_policy: InactivePolicy,
    pub picker_limit: usize,
    pub open_first_match: bool,
    pub request_timeout: Duration,
    pub stream_timeout: Duration,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for AgentSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            inactive_policy: cfg.agent.inactive_policy,
            picker_limit: cfg.agent.picker_limit,
            open_first_match: cfg.agent.open_first_match,
            request_timeout: Duration::from_secs(cfg.llm.timeouts.request),
            stream_timeout: Duration::from_secs(cfg.llm.timeouts.stream),
        }
    }
}

/// 根据配置与环境变量选择 LLM 后端（DeepSeek / OpenAI 兼容 / Mock）
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    // 有 DeepSeek Key，或配置为 deepseek 且仅有 OpenAI Key 时也走 DeepSeek 兼容端点
    let use_deepseek = std::env::var("DEEPSEEK_API_KEY").is_ok()
        || (provider == "deepseek" && std::env::var("OPENAI_API_KEY").is_ok());
    let use_openai = std::env::var("OPENAI_API_KEY").is_ok() && provider != "deepseek";

    if use_deepseek {
        let model = cfg
            .llm
            .deepseek
            .model
            .clone()
            .unwrap_or_else(|| cfg.llm.model.clone());
        tracing::info!("Using DeepSeek LLM ({})", model);
        Arc::new(OpenAiClient::deepseek(Some(&model)))
    } else if use_openai {
        let model = cfg
            .llm
            .openai
            .model
            .clone()
            .unwrap_or_else(|| "gpt-4o-mini".to_string());
        tracing::info!("Using OpenAI LLM ({})", model);
        Arc::new(OpenAiClient::new(
            cfg.llm.base_url.as_deref(),
            &model,
            std::env::var("OPENAI_API_KEY").ok().as_deref(),
        ))
    } else {
        tracing::warn!("No API key set or provider unknown, using Mock LLM");
        Arc::new(MockLlmClient)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// 编码助手 Agent
pub struct Agent {
    state: RwLock<SessionState>,
    settings: AgentSettings,
    llm: BoundedLlm,
    classifier: ActionClassifier,
    executors: Executors,
    ui: Arc<dyn UiCapability>,
    events: Option<mpsc::UnboundedSender<AgentEvent>>,
}

impl Agent {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        files: Arc<dyn FileCapability>,
        ui: Arc<dyn UiCapability>,
        settings: AgentSettings,
    ) -> Self {
        let llm = BoundedLlm::new(llm, settings.request_timeout, settings.stream_timeout);
        let executors = Executors::new(ExecutorContext {
            llm: llm.clone(),
            files,
            ui: ui.clone(),
            picker_limit: settings.picker_limit,
            open_first_match: settings.open_first_match,
        });
        Self {
            state: RwLock::new(SessionState::default()),
            classifier: ActionClassifier::new(llm.clone()),
            llm,
            executors,
            ui,
            settings,
            events: None,
        }
    }

    /// 附加事件通道；展示层从接收端读取 AgentEvent
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<AgentEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// LLM 累计 token 统计：(prompt, completion, total)
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    pub async fn start(&self) {
        self.state.write().await.start();
        tracing::info!("agent started");
    }

    pub async fn stop(&self) {
        self.state.write().await.stop();
        tracing::info!("agent stopped");
    }

    pub async fn is_active(&self) -> bool {
        self.state.read().await.active
    }

    /// 当前会话状态快照
    pub async fn session(&self) -> SessionState {
        self.state.read().await.clone()
    }

    fn emit(&self, event: AgentEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// 未激活时按策略处理：Reject 直接返回错误响应，Process 照常执行
    async fn reject_if_inactive(&self, request: &Request) -> Option<Response> {
        if self.is_active().await {
            return None;
        }
        match self.settings.inactive_policy {
            InactivePolicy::Reject => {
                tracing::warn!(request_id = %request.id(), "request rejected: agent is not active");
                Some(Response::error(request, crate::core::AgentError::Inactive))
            }
            InactivePolicy::Process => {
                tracing::debug!(request_id = %request.id(), "agent inactive, processing anyway");
                None
            }
        }
    }

    async fn classify_and_dispatch(&self, request: &Request) -> Action {
        let action = self.classifier.determine(request).await;
        tracing::info!(
            request_id = %request.id(),
            kind = %action.kind,
            reasoning = %action.reasoning,
            "dispatching action"
        );
        self.executors.dispatch(request, &action).await
    }

    async fn report_panic(&self, request: &Request, payload: Box<dyn Any + Send>) -> Response {
        let message = panic_message(payload.as_ref());
        tracing::error!(request_id = %request.id(), panic = %message, "request handling panicked");
        self.ui
            .notify(&format!("Agent error: {message}"), NotifyLevel::Error)
            .await;
        Response::error(request, message)
    }

    /// 处理一次请求：分类、分发、组装响应；永不失败
    pub async fn process_request(&self, request: &Request) -> Response {
        if let Some(rejected) = self.reject_if_inactive(request).await {
            return rejected;
        }
        self.emit(AgentEvent::Message(ChatMessage::user(request.prompt())));
        self.emit(AgentEvent::Message(ChatMessage::thinking()));

        self.state.write().await.begin_task(request.prompt());
        let outcome = AssertUnwindSafe(self.classify_and_dispatch(request))
            .catch_unwind()
            .await;
        self.state.write().await.end_task();

        let response = match outcome {
            Ok(action) => Response::new(
                request,
                action,
                format!("Processed request: {}", request.prompt()),
            ),
            Err(payload) => self.report_panic(request, payload).await,
        };
        self.emit(AgentEvent::Message(ChatMessage::assistant(
            response.action.content.clone().unwrap_or_default(),
        )));
        response
    }

    /// 流式回复：跳过分类，逐 Token 回调，最终返回 Respond 响应
    pub async fn process_request_streaming(
        &self,
        request: &Request,
        on_token: &mut (dyn for<'t> FnMut(&'t str) + Send),
    ) -> Response {
        if let Some(rejected) = self.reject_if_inactive(request).await {
            return rejected;
        }
        self.emit(AgentEvent::Message(ChatMessage::user(request.prompt())));

        let message_id = Uuid::new_v4().to_string();
        let events = self.events.clone();
        let mut forward = |token: &str| {
            on_token(token);
            if let Some(tx) = &events {
                let _ = tx.send(AgentEvent::Token {
                    message_id: message_id.clone(),
                    token: token.to_string(),
                });
            }
        };

        self.state.write().await.begin_task(request.prompt());
        let outcome = AssertUnwindSafe(self.llm.complete_streaming(
            request.prompt(),
            request.context(),
            &mut forward,
        ))
        .catch_unwind()
        .await;
        self.state.write().await.end_task();

        let response = match outcome {
            Ok(Ok(text)) => Response::new(
                request,
                Action::executed(ActionKind::Respond, None, text, "Streaming chat response"),
                format!("Processed request: {}", request.prompt()),
            ),
            Ok(Err(e)) => {
                tracing::warn!(request_id = %request.id(), error = %e, "streaming response failed");
                self.ui
                    .notify(&format!("Respond action failed: {e}"), NotifyLevel::Error)
                    .await;
                Response::error(request, e)
            }
            Err(payload) => self.report_panic(request, payload).await,
        };
        self.emit(AgentEvent::done(message_id));
        response
    }
}
