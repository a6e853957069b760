use serde::{Deserialize, Serialize};

/// A single entry in the conversation history.
///
/// The four roles carry different fields, so `Message` is a tagged union
/// rather than one struct with a pile of optionals: an assistant message is
/// the only place tool calls can appear, and a tool message always names the
/// call it answers. A message with fields that do not belong to its role is
/// unrepresentable.
///
/// Serialization follows the chat-completions wire schema — `role`,
/// `content`, and where applicable `tool_calls`, `tool_call_id`, `name` —
/// so a serialized history can be fed to any OpenAI-compatible endpoint or
/// written out verbatim for logging.
///
/// ```
/// use cognicore::Message;
/// let m = Message::user("What is 12 * 5?");
/// assert_eq!(serde_json::to_value(&m).unwrap()["role"], "user");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// Instruction that sets the agent's persona and behavior.
    System { content: String },
    /// Input from the end user.
    User { content: String },
    /// Output from the reasoning backend: either a final answer (`content`
    /// set, `tool_calls` empty) or a batch of tool requests (`content`
    /// absent, serialized as `null` per the wire schema).
    Assistant {
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// Observation produced by executing a tool call, answering exactly one
    /// `ToolCall` from an earlier assistant message.
    Tool {
        tool_call_id: String,
        name: String,
        content: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System { content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User { content: content.into() }
    }

    /// A final-answer assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant { content: Some(content.into()), tool_calls: Vec::new() }
    }

    /// An assistant message that requests tool invocations. `content` is
    /// absent — the turn is not finished yet.
    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant { content: None, tool_calls }
    }

    /// An observation message answering the tool call with the given id.
    pub fn tool(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            content: content.into(),
        }
    }

    /// The textual content of this message, if it has any.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::System { content } | Self::User { content } | Self::Tool { content, .. } => {
                Some(content)
            }
            Self::Assistant { content, .. } => content.as_deref(),
        }
    }

    /// Tool calls carried by this message (empty for non-assistant roles).
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
            Self::Tool { .. } => "tool",
        }
    }
}

/// A tool invocation requested by the reasoning backend.
///
/// `arguments` is the provider's JSON-encoded argument string, passed
/// through untouched; the dispatcher parses it at execution time so a
/// malformed payload becomes an observation instead of a turn failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ToolCallWire", into = "ToolCallWire")]
pub struct ToolCall {
    /// Unique within the assistant turn that emitted it.
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self { id: id.into(), name: name.into(), arguments: arguments.into() }
    }
}

/// Wire form of a tool call: `{id, type: "function", function: {name,
/// arguments}}`. Bridged to/from [`ToolCall`] by serde so the flat struct
/// stays pleasant to work with in code.
#[derive(Clone, Serialize, Deserialize)]
struct ToolCallWire {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: FunctionCallWire,
}

#[derive(Clone, Serialize, Deserialize)]
struct FunctionCallWire {
    name: String,
    arguments: String,
}

impl From<ToolCallWire> for ToolCall {
    fn from(w: ToolCallWire) -> Self {
        Self { id: w.id, name: w.function.name, arguments: w.function.arguments }
    }
}

impl From<ToolCall> for ToolCallWire {
    fn from(tc: ToolCall) -> Self {
        Self {
            id: tc.id,
            kind: "function".to_string(),
            function: FunctionCallWire { name: tc.name, arguments: tc.arguments },
        }
    }
}

/// Normalized reply from a reasoning backend.
///
/// Invariant: if `tool_calls` is empty, `content` must be present — it is
/// the turn's final answer. If `tool_calls` is non-empty the turn is not
/// finished and `content` is typically absent. The agent checks this at the
/// loop boundary; the constructors build well-formed values.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    /// Opaque provider payload, kept for diagnostics only. Never inspected
    /// by the core loop.
    pub raw: Option<serde_json::Value>,
}

impl LlmResponse {
    /// A final answer with no tool requests.
    pub fn answer(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), tool_calls: Vec::new(), raw: None }
    }

    /// A reply requesting the given tool invocations.
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self { content: None, tool_calls: calls, raw: None }
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }

    /// True when this reply finishes the turn.
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// Configuration for the agent's reason-act loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Hard cap on tool-execution rounds within a single turn. Always
    /// enforced — a backend that never stops requesting tools makes exactly
    /// this many reasoning calls before the turn fails.
    pub max_tool_rounds: usize,

    /// Execute a multi-call batch concurrently. Observations are appended
    /// in request order either way, and one failing call never cancels the
    /// others.
    pub parallel_tools: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 10,
            parallel_tools:  false,
        }
    }
}
