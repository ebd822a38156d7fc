//! 带超时的 LLM 调用
//!
//! 对每次 complete / complete_streaming 施加超时，超时或失败统一映射为 AgentError（LlmTimeout / Llm）。

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::core::AgentError;
use crate::llm::LlmClient;

/// 默认请求超时（秒）
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// 超时包装：分类器与各执行器共享
#[derive(Clone)]
pub struct BoundedLlm {
    inner: Arc<dyn LlmClient>,
    request_timeout: Duration,
    stream_timeout: Duration,
}

impl BoundedLlm {
    pub fn new(
        inner: Arc<dyn LlmClient>,
        request_timeout: Duration,
        stream_timeout: Duration,
    ) -> Self {
        Self {
            inner,
            request_timeout,
            stream_timeout,
        }
    }

    /// 底层客户端的累计 token 统计：(prompt, completion, total)
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.inner.token_usage()
    }

    /// 非流式完成；超时返回 LlmTimeout
    pub async fn complete(&self, prompt: &str, context: &[String]) -> Result<String, AgentError> {
        let start = Instant::now();
        let result = timeout(self.request_timeout, self.inner.complete(prompt, context)).await;
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            prompt_chars = prompt.len(),
            "llm complete"
        );
        match result {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(AgentError::Llm(e)),
            Err(_) => Err(AgentError::LlmTimeout(self.request_timeout.as_secs())),
        }
    }

    /// 流式完成；整个流的耗时受 stream_timeout 限制
    pub async fn complete_streaming(
        &self,
        prompt: &str,
        context: &[String],
        on_token: &mut (dyn for<'t> FnMut(&'t str) + Send),
    ) -> Result<String, AgentError> {
        let result = timeout(
            self.stream_timeout,
            self.inner.complete_streaming(prompt, context, on_token),
        )
        .await;
        match result {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(AgentError::Llm(e)),
            Err(_) => Err(AgentError::LlmTimeout(self.stream_timeout.as_secs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::llm::{LlmError, ScriptedLlmClient, TokenStream};

    #[tokio::test]
    async fn test_timeout_maps_to_llm_timeout() {
        let slow = ScriptedLlmClient::new()
            .always("late")
            .with_delay(Duration::from_millis(200));
        let llm = BoundedLlm::new(
            Arc::new(slow),
            Duration::from_millis(20),
            Duration::from_millis(20),
        );
        let err = llm.complete("hi", &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::LlmTimeout(_)));
    }

    #[tokio::test]
    async fn test_error_maps_to_llm_error() {
        let llm = BoundedLlm::new(
            Arc::new(ScriptedLlmClient::new().fail("502")),
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        let err = llm.complete("hi", &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::Llm(_)));
    }

    struct MeteredLlm;

    #[async_trait]
    impl LlmClient for MeteredLlm {
        async fn complete(
            &self,
            _prompt: &str,
            _context: &[String],
        ) -> Result<String, LlmError> {
            Ok("ok".to_string())
        }

        async fn complete_stream(
            &self,
            _prompt: &str,
            _context: &[String],
        ) -> Result<TokenStream, LlmError> {
            Err(LlmError::Stream("not streamed".to_string()))
        }

        fn token_usage(&self) -> (u64, u64, u64) {
            (7, 5, 12)
        }
    }

    #[tokio::test]
    async fn test_token_usage_comes_from_inner_client() {
        let llm = BoundedLlm::new(
            Arc::new(MeteredLlm),
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        assert_eq!(llm.complete("hi", &[]).await.unwrap(), "ok");
        assert_eq!(llm.token_usage(), (7, 5, 12));
    }
}
