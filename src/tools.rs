use crate::error::ToolError;
use crate::types::{Message, ToolCall};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// A capability the agent can expose to its reasoning backend.
///
/// # Contract
/// - `name` must be unique within one agent's tool set.
/// - `description` is advertised verbatim to the backend; write it for the
///   model, not for humans.
/// - `run` returns the observation text on success. On failure it returns
///   `ToolError` — never panic; the dispatcher turns the error into an
///   observation message and the turn continues.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters. The default is a single
    /// required `tool_input` string, which is what `run` receives.
    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "tool_input": {
                    "type": "string",
                    "description": "The input to be passed to the tool."
                }
            },
            "required": ["tool_input"]
        })
    }

    async fn run(&self, input: &str) -> Result<String, ToolError>;
}

/// Tool descriptor sent to the reasoning backend.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolSchema {
    pub name:         String,
    pub description:  String,
    pub input_schema: Value,
}

/// Name → implementation mapping plus the dispatch policy.
///
/// Dispatch is fail-soft: an unknown tool name, unparseable arguments, or a
/// faulting `run` all become `tool`-role observation messages with matching
/// `tool_call_id`, and a fault in one call of a batch never prevents the
/// rest from executing.
#[derive(Default)]
pub struct ToolRegistry {
    // Insertion-ordered so advertised descriptors and batch dispatch are
    // deterministic across runs.
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&i) => self.tools[i] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Descriptors for every registered tool, in registration order.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .iter()
            .map(|t| ToolSchema {
                name:         t.name().to_string(),
                description:  t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Execute one requested invocation and produce its observation
    /// message. Never fails outward.
    pub async fn dispatch(&self, call: &ToolCall) -> Message {
        let started = Instant::now();
        let content = match self.execute(call).await {
            Ok(output) => {
                tracing::debug!(
                    tool = %call.name,
                    id = %call.id,
                    latency_ms = started.elapsed().as_millis() as u64,
                    "tool call succeeded"
                );
                output
            }
            Err(err) => {
                tracing::warn!(tool = %call.name, id = %call.id, error = %err, "tool call failed");
                format!("Error: {}", err)
            }
        };
        Message::tool(call.id.as_str(), call.name.as_str(), content)
    }

    /// Execute a batch of invocations from one assistant turn.
    ///
    /// Observations come back in request order. With `parallel` set the
    /// calls run concurrently; ordering of the returned messages is
    /// unchanged and a fault in one call never cancels the others.
    pub async fn dispatch_all(&self, calls: &[ToolCall], parallel: bool) -> Vec<Message> {
        if parallel {
            futures::future::join_all(calls.iter().map(|c| self.dispatch(c))).await
        } else {
            let mut observations = Vec::with_capacity(calls.len());
            for call in calls {
                observations.push(self.dispatch(call).await);
            }
            observations
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let tool = self
            .index
            .get(&call.name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| ToolError::Unknown(call.name.clone()))?;

        let input = parse_tool_input(&call.name, &call.arguments)?;
        tool.run(&input).await
    }
}

/// Pull the `tool_input` string out of the provider's JSON argument
/// payload.
fn parse_tool_input(tool: &str, arguments: &str) -> Result<String, ToolError> {
    let parsed: Value =
        serde_json::from_str(arguments).map_err(|e| ToolError::InvalidArguments {
            tool:   tool.to_string(),
            reason: format!("arguments are not valid JSON: {}", e),
        })?;
    parsed
        .get("tool_input")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolError::InvalidArguments {
            tool:   tool.to_string(),
            reason: "missing string field 'tool_input'".to_string(),
        })
}

/// Binary infix arithmetic over `+ - * /`.
///
/// Input format is `"<number> <operator> <number>"`, e.g. `"150 / 10"`.
/// Results are rendered as floats (`"15.0"`), matching what the tool's
/// description promises the model.
pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Performs basic arithmetic. Input must be '<number> <operator> <number>' \
         with one of + - * /, for example '150 / 10'. Returns the result as a float."
    }

    async fn run(&self, input: &str) -> Result<String, ToolError> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let &[lhs, op, rhs] = parts.as_slice() else {
            return Err(ToolError::execution(
                self.name(),
                format!("Invalid input format: expected '<number> <operator> <number>', got '{}'", input),
            ));
        };

        let parse = |s: &str| {
            s.parse::<f64>().map_err(|_| {
                ToolError::execution(
                    self.name(),
                    format!("Invalid input format: '{}' is not a number", s),
                )
            })
        };
        let (a, b) = (parse(lhs)?, parse(rhs)?);

        let result = match op {
            "+" => a + b,
            "-" => a - b,
            "*" => a * b,
            "/" => {
                if b == 0.0 {
                    return Err(ToolError::execution(self.name(), "Division by zero"));
                }
                a / b
            }
            _ => {
                return Err(ToolError::execution(
                    self.name(),
                    format!("Invalid operator: '{}'", op),
                ))
            }
        };

        Ok(format!("{:?}", result))
    }
}
