use crate::error::BackendError;
use crate::tools::ToolSchema;
use crate::types::{LlmResponse, Message};
use async_trait::async_trait;

mod anthropic;
mod openai;
mod retry;
mod scripted;

pub use anthropic::AnthropicBackend;
pub use openai::OpenAiBackend;
pub use retry::RetryingBackend;
pub use scripted::{FailingBackend, ScriptedBackend};

/// The single interface between the agent and any reasoning provider.
///
/// # Contract
/// - Must be Send + Sync (used behind `Box<dyn LlmBackend>`).
/// - Returns `Ok(LlmResponse)` for any valid completion, translating the
///   provider's reply into the normalized form: tool requests in
///   `tool_calls`, final text in `content`, the untouched provider payload
///   in `raw`.
/// - Returns `Err(BackendError)` only for unrecoverable failures —
///   transport, authentication, or an unparseable response. The agent does
///   not retry; wrap the backend in [`RetryingBackend`] if you want
///   back-off.
/// - Must include every descriptor in `tools` in the provider request.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn get_completion(
        &self,
        history: &[Message],
        tools: &[ToolSchema],
    ) -> Result<LlmResponse, BackendError>;
}
