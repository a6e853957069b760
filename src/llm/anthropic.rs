use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::BackendError;
use crate::llm::LlmBackend;
use crate::tools::ToolSchema;
use crate::types::{LlmResponse, Message, ToolCall};

// ── Request types ────────────────────────────────────────

#[derive(serde::Serialize)]
struct AnthropicRequest {
    model:      String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system:     Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools:      Vec<AnthropicToolDef>,
    messages:   Vec<AnthropicMessage>,
}

#[derive(serde::Serialize)]
struct AnthropicToolDef {
    name:         String,
    description:  String,
    input_schema: Value,
}

#[derive(serde::Serialize)]
struct AnthropicMessage {
    role:    String,
    content: Value, // string or array of content blocks
}

// ── Response types ───────────────────────────────────────

#[derive(serde::Deserialize, serde::Serialize, Debug)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug)]
#[serde(tag = "type")]
enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "tool_use")]
    ToolUse { id: String, name: String, input: Value },
}

// ── Backend ──────────────────────────────────────────────

/// Backend for Anthropic's Messages API.
///
/// The history's wire schema differs from Anthropic's: the system message
/// travels as a top-level field, and tool exchanges become `tool_use` /
/// `tool_result` content blocks. The translation lives entirely here; the
/// agent never sees provider shapes.
pub struct AnthropicBackend {
    client:   reqwest::Client,
    api_key:  String,
    api_base: String,
    model:    String,
}

impl AnthropicBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client:   reqwest::Client::new(),
            api_key:  api_key.into(),
            api_base: "https://api.anthropic.com".to_string(),
            model:    model.into(),
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self, BackendError> {
        let key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| BackendError::Auth("ANTHROPIC_API_KEY not set".to_string()))?;
        Ok(Self::new(key, model))
    }

    fn build_tool_defs(tools: &[ToolSchema]) -> Vec<AnthropicToolDef> {
        tools
            .iter()
            .map(|s| AnthropicToolDef {
                name:         s.name.clone(),
                description:  s.description.clone(),
                input_schema: s.input_schema.clone(),
            })
            .collect()
    }

    /// Split the history into the top-level system string and the
    /// Anthropic-shaped message list.
    fn build_messages(history: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system = None;
        let mut messages = Vec::new();

        for msg in history {
            match msg {
                Message::System { content } => system = Some(content.clone()),
                Message::User { content } => messages.push(AnthropicMessage {
                    role:    "user".to_string(),
                    content: Value::String(content.clone()),
                }),
                Message::Assistant { content, tool_calls } => {
                    if tool_calls.is_empty() {
                        messages.push(AnthropicMessage {
                            role:    "assistant".to_string(),
                            content: Value::String(content.clone().unwrap_or_default()),
                        });
                    } else {
                        let blocks: Vec<Value> = tool_calls
                            .iter()
                            .map(|tc| {
                                let input = serde_json::from_str(&tc.arguments)
                                    .unwrap_or(Value::Object(Default::default()));
                                json!({
                                    "type": "tool_use",
                                    "id": tc.id,
                                    "name": tc.name,
                                    "input": input
                                })
                            })
                            .collect();
                        messages.push(AnthropicMessage {
                            role:    "assistant".to_string(),
                            content: Value::Array(blocks),
                        });
                    }
                }
                Message::Tool { tool_call_id, content, .. } => messages.push(AnthropicMessage {
                    role:    "user".to_string(),
                    content: json!([{
                        "type": "tool_result",
                        "tool_use_id": tool_call_id,
                        "content": content
                    }]),
                }),
            }
        }

        (system, messages)
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn get_completion(
        &self,
        history: &[Message],
        tools: &[ToolSchema],
    ) -> Result<LlmResponse, BackendError> {
        let (system, messages) = Self::build_messages(history);

        let body = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: 4096,
            system,
            tools: Self::build_tool_defs(tools),
            messages,
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.api_base))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(format!("network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let msg = format!("Anthropic API error {}: {}", status, body);
            return Err(if status.as_u16() == 401 || status.as_u16() == 403 {
                BackendError::Auth(msg)
            } else {
                BackendError::Transport(msg)
            });
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(format!("unparseable response: {}", e)))?;
        let raw = serde_json::to_value(&parsed).ok();

        let mut content = None;
        let mut tool_calls = Vec::new();
        for block in parsed.content {
            match block {
                AnthropicContentBlock::Text { text } => content = Some(text),
                AnthropicContentBlock::ToolUse { id, name, input } => {
                    tool_calls.push(ToolCall::new(id, name, input.to_string()));
                }
            }
        }

        if content.is_none() && tool_calls.is_empty() {
            return Err(BackendError::Malformed(
                "response carries neither content nor tool calls".to_string(),
            ));
        }

        Ok(LlmResponse { content, tool_calls, raw })
    }
}
