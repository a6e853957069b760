use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::BackendError;
use crate::llm::LlmBackend;
use crate::tools::ToolSchema;
use crate::types::{LlmResponse, Message};

/// Wrapper around any `LlmBackend` that retries transient transport
/// failures with exponential back-off.
///
/// Only `BackendError::Transport` is retried. Authentication failures and
/// malformed responses return immediately — retrying those just burns time.
/// The agent core itself never retries; this decorator is where that policy
/// lives when a deployment wants it.
pub struct RetryingBackend {
    inner:       Arc<dyn LlmBackend>,
    max_retries: u32,
}

impl RetryingBackend {
    pub fn new(inner: Arc<dyn LlmBackend>, max_retries: u32) -> Self {
        Self { inner, max_retries }
    }

    fn backoff(attempt: u32) -> Duration {
        Duration::from_secs(std::cmp::min(1u64 << attempt, 60))
    }
}

#[async_trait]
impl LlmBackend for RetryingBackend {
    async fn get_completion(
        &self,
        history: &[Message],
        tools: &[ToolSchema],
    ) -> Result<LlmResponse, BackendError> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            match self.inner.get_completion(history, tools).await {
                Ok(resp) => return Ok(resp),
                Err(e @ BackendError::Auth(_)) => {
                    tracing::error!(error = %e, "backend auth error, not retrying");
                    return Err(e);
                }
                Err(e @ BackendError::Malformed(_)) => {
                    tracing::error!(error = %e, "malformed backend response, not retrying");
                    return Err(e);
                }
                Err(e @ BackendError::Transport(_)) => {
                    if attempt < self.max_retries {
                        let wait = Self::backoff(attempt);
                        tracing::warn!(
                            attempt = attempt + 1,
                            max     = self.max_retries,
                            wait_s  = wait.as_secs(),
                            error   = %e,
                            "transient backend error, retrying"
                        );
                        tokio::time::sleep(wait).await;
                    }
                    last_err = Some(e);
                }
            }
        }

        let last = last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Err(BackendError::Transport(format!(
            "backend failed after {} retries, last error: {}",
            self.max_retries, last
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with a transport error `failures` times, then answers.
    struct FlakyBackend {
        failures: u32,
        calls:    AtomicU32,
    }

    #[async_trait]
    impl LlmBackend for FlakyBackend {
        async fn get_completion(
            &self,
            _history: &[Message],
            _tools: &[ToolSchema],
        ) -> Result<LlmResponse, BackendError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(BackendError::Transport("flaky".to_string()))
            } else {
                Ok(LlmResponse::answer("recovered"))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried() {
        let backend = RetryingBackend::new(
            Arc::new(FlakyBackend { failures: 2, calls: AtomicU32::new(0) }),
            3,
        );
        let resp = backend.get_completion(&[], &[]).await.unwrap();
        assert_eq!(resp.content.as_deref(), Some("recovered"));
    }

    #[tokio::test]
    async fn auth_errors_are_not_retried() {
        struct AuthFail(AtomicU32);

        #[async_trait]
        impl LlmBackend for AuthFail {
            async fn get_completion(
                &self,
                _history: &[Message],
                _tools: &[ToolSchema],
            ) -> Result<LlmResponse, BackendError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::Auth("bad key".to_string()))
            }
        }

        let inner = Arc::new(AuthFail(AtomicU32::new(0)));
        let backend = RetryingBackend::new(inner.clone(), 5);
        let err = backend.get_completion(&[], &[]).await.unwrap_err();
        assert!(matches!(err, BackendError::Auth(_)));
        assert_eq!(inner.0.load(Ordering::SeqCst), 1, "exactly one attempt");
    }
}
