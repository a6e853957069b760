use crate::error::{AgentError, BackendError};
use crate::llm::LlmBackend;
use crate::memory::HistoryStore;
use crate::tools::ToolRegistry;
use crate::types::{AgentConfig, Message};

/// Phases of one reason-act turn.
///
/// `AwaitingInput → Reasoning → (tool calls?) → ToolExecution → Reasoning
/// → … → Responding → AwaitingInput`. The machine is fixed; what varies per
/// round is only whether the backend's reply requests tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingInput,
    Reasoning,
    ToolExecution,
    Responding,
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingInput => "AwaitingInput",
            Self::Reasoning     => "Reasoning",
            Self::ToolExecution => "ToolExecution",
            Self::Responding    => "Responding",
        };
        write!(f, "{}", s)
    }
}

/// A conversational agent assembled from three swappable capabilities: a
/// reasoning backend, a history store, and a set of tools.
///
/// The agent exclusively drives mutation of its history store during a
/// turn. Concurrent turns on one instance are not supported — callers must
/// not invoke `chat` again while a turn is in flight (`&mut self` enforces
/// this within safe code).
impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("system_prompt", &self.system_prompt)
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

pub struct Agent {
    llm:           Box<dyn LlmBackend>,
    memory:        Box<dyn HistoryStore>,
    tools:         ToolRegistry,
    system_prompt: String,
    config:        AgentConfig,
    state:         TurnState,
}

impl Agent {
    /// Prefer [`AgentBuilder`](crate::builder::AgentBuilder) for ergonomic
    /// construction. Clears the history store and seeds it with the system
    /// prompt.
    pub fn new(
        llm: Box<dyn LlmBackend>,
        memory: Box<dyn HistoryStore>,
        tools: ToolRegistry,
        system_prompt: impl Into<String>,
        config: AgentConfig,
    ) -> Self {
        let mut agent = Self {
            llm,
            memory,
            tools,
            system_prompt: system_prompt.into(),
            config,
            state: TurnState::AwaitingInput,
        };
        agent.reset();
        agent
    }

    /// Run one full turn: append the user input, then interleave reasoning
    /// calls with tool execution until the backend answers without
    /// requesting tools.
    ///
    /// Tool faults never fail the turn — they come back to the backend as
    /// observations. `BackendError` and `ToolLoopExceeded` are turn-fatal:
    /// the error propagates and history retains everything appended so far
    /// (no rollback).
    pub async fn chat(&mut self, input: &str) -> Result<String, AgentError> {
        tracing::info!(input_len = input.len(), "turn start");
        self.memory.add_message(Message::user(input));

        let schemas = self.tools.schemas();
        let mut rounds: usize = 0;

        loop {
            // The guard fires in place of the next reasoning call once the
            // configured number of tool rounds has completed: a backend
            // that never stops requesting tools makes exactly
            // `max_tool_rounds` reasoning calls before the turn fails.
            if rounds > 0 && rounds >= self.config.max_tool_rounds {
                self.state = TurnState::AwaitingInput;
                tracing::error!(rounds, max = self.config.max_tool_rounds, "tool loop exceeded");
                return Err(AgentError::ToolLoopExceeded {
                    rounds,
                    max: self.config.max_tool_rounds,
                });
            }

            self.transition(TurnState::Reasoning);
            let history = self.memory.get_history();
            let response = match self.llm.get_completion(&history, &schemas).await {
                Ok(r) => r,
                Err(e) => {
                    self.state = TurnState::AwaitingInput;
                    tracing::error!(error = %e, "backend failed, turn aborted");
                    return Err(e.into());
                }
            };

            if response.is_final() {
                let content = match response.content {
                    Some(c) => c,
                    None => {
                        self.state = TurnState::AwaitingInput;
                        return Err(BackendError::Malformed(
                            "final response without content".to_string(),
                        )
                        .into());
                    }
                };
                self.memory.add_message(Message::assistant(content.clone()));
                self.transition(TurnState::Responding);
                tracing::info!(rounds, answer_len = content.len(), "turn complete");
                self.state = TurnState::AwaitingInput;
                return Ok(content);
            }

            rounds += 1;
            tracing::debug!(round = rounds, calls = response.tool_calls.len(), "tool round");
            self.memory
                .add_message(Message::assistant_tool_calls(response.tool_calls.clone()));

            self.transition(TurnState::ToolExecution);
            let observations = self
                .tools
                .dispatch_all(&response.tool_calls, self.config.parallel_tools)
                .await;
            for observation in observations {
                self.memory.add_message(observation);
            }
        }
    }

    /// Clear the history store and re-seed the system prompt. Used by the
    /// simulator to isolate scenarios.
    pub fn reset(&mut self) {
        self.memory.clear();
        self.memory.add_message(Message::system(self.system_prompt.clone()));
        self.state = TurnState::AwaitingInput;
    }

    /// Snapshot of the conversation history.
    pub fn history(&self) -> Vec<Message> {
        self.memory.get_history()
    }

    /// The full history in the serialized wire schema (`role`, `content`,
    /// `tool_calls`, `tool_call_id`, `name`), for interop and logging.
    pub fn transcript_json(&self) -> serde_json::Value {
        serde_json::to_value(self.history()).unwrap_or_else(|_| serde_json::json!([]))
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    fn transition(&mut self, next: TurnState) {
        tracing::debug!(from = %self.state, to = %next, "transition");
        self.state = next;
    }
}
