use crate::error::BackendError;
use crate::llm::LlmBackend;
use crate::tools::ToolSchema;
use crate::types::{LlmResponse, Message};
use async_trait::async_trait;
use std::sync::Mutex;

/// Deterministic backend that replays a pre-scripted sequence of responses
/// indexed by call count. Injected through the same constructor pathway as
/// a real backend, so tests and simulations need no patching mechanism.
///
/// Running past the end of the script is a `BackendError::Transport` — a
/// scenario that makes more reasoning calls than its author scripted is a
/// bug worth surfacing loudly.
pub struct ScriptedBackend {
    responses: Mutex<Vec<Result<LlmResponse, BackendError>>>,
    calls:     Mutex<Vec<usize>>, // history length seen by each call
}

impl ScriptedBackend {
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    /// Script failures as well as successes, e.g. a transport outage on
    /// the third call.
    pub fn with_results(responses: Vec<Result<LlmResponse, BackendError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            calls:     Mutex::new(Vec::new()),
        }
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// History length observed by the nth call (0-indexed). Useful for
    /// asserting that observations were appended before the next round.
    pub fn history_len_for_call(&self, n: usize) -> Option<usize> {
        self.calls.lock().unwrap().get(n).copied()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn get_completion(
        &self,
        history: &[Message],
        _tools: &[ToolSchema],
    ) -> Result<LlmResponse, BackendError> {
        self.calls.lock().unwrap().push(history.len());

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(BackendError::Transport(
                "scripted backend exhausted: no more programmed responses".to_string(),
            ));
        }
        responses.remove(0)
    }
}

/// Backend that fails every call. Handy for exercising turn-fatal paths.
pub struct FailingBackend(pub BackendError);

#[async_trait]
impl LlmBackend for FailingBackend {
    async fn get_completion(
        &self,
        _history: &[Message],
        _tools: &[ToolSchema],
    ) -> Result<LlmResponse, BackendError> {
        Err(self.0.clone())
    }
}
