use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionTool, ChatCompletionToolType,
        CreateChatCompletionRequestArgs, FunctionObject,
    },
    Client,
};
use async_trait::async_trait;

use crate::error::BackendError;
use crate::llm::LlmBackend;
use crate::tools::ToolSchema;
use crate::types::{LlmResponse, Message, ToolCall};

/// Backend for OpenAI's chat-completions API and every OpenAI-compatible
/// provider (Groq, Together, Ollama, Fireworks, ...).
pub struct OpenAiBackend {
    client: Client<OpenAIConfig>,
    model:  String,
}

impl OpenAiBackend {
    /// Standard OpenAI client using the OPENAI_API_KEY env var.
    pub fn new(model: impl Into<String>) -> Self {
        Self { client: Client::new(), model: model.into() }
    }

    /// Custom base URL, e.g. "https://api.groq.com/openai/v1".
    pub fn with_base_url(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key(api_key);
        Self { client: Client::with_config(config), model: model.into() }
    }

    fn build_tools(tools: &[ToolSchema]) -> Vec<ChatCompletionTool> {
        tools
            .iter()
            .map(|schema| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name:        schema.name.clone(),
                    description: Some(schema.description.clone()),
                    parameters:  Some(schema.input_schema.clone()),
                },
            })
            .collect()
    }

    fn classify(err: async_openai::error::OpenAIError) -> BackendError {
        let msg = err.to_string();
        let lower = msg.to_lowercase();
        if lower.contains("401")
            || lower.contains("403")
            || lower.contains("unauthorized")
            || lower.contains("forbidden")
            || lower.contains("invalid api key")
        {
            BackendError::Auth(msg)
        } else {
            BackendError::Transport(msg)
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn get_completion(
        &self,
        history: &[Message],
        tools: &[ToolSchema],
    ) -> Result<LlmResponse, BackendError> {
        // Our wire schema is the OpenAI message schema, so a serde
        // round-trip turns the history into typed request messages.
        let history_json = serde_json::to_value(history)
            .map_err(|e| BackendError::Malformed(format!("failed to serialize history: {}", e)))?;
        let messages: Vec<ChatCompletionRequestMessage> = serde_json::from_value(history_json)
            .map_err(|e| BackendError::Malformed(format!("failed to build messages: {}", e)))?;

        let oai_tools = Self::build_tools(tools);

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(&self.model).messages(messages);
        if !oai_tools.is_empty() {
            request_builder.tools(oai_tools);
        }
        let request = request_builder
            .build()
            .map_err(|e| BackendError::Malformed(format!("failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(Self::classify)?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Malformed("empty response from OpenAI".to_string()))?;
        let message = choice.message;
        let raw = serde_json::to_value(&message).ok();

        let tool_calls: Vec<ToolCall> = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall::new(tc.id, tc.function.name, tc.function.arguments))
            .collect();

        if tool_calls.is_empty() && message.content.is_none() {
            return Err(BackendError::Malformed(
                "response carries neither content nor tool calls".to_string(),
            ));
        }

        Ok(LlmResponse {
            content: message.content,
            tool_calls,
            raw,
        })
    }
}
