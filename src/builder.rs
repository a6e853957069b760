use std::sync::Arc;

use crate::agent::Agent;
use crate::error::AgentError;
use crate::llm::LlmBackend;
use crate::memory::{HistoryStore, VolatileMemory};
use crate::tools::{Tool, ToolRegistry};
use crate::types::AgentConfig;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Ergonomic construction of an [`Agent`].
///
/// ```no_run
/// use std::sync::Arc;
/// use cognicore::{AgentBuilder, CalculatorTool, OpenAiBackend};
///
/// let agent = AgentBuilder::new()
///     .backend(Box::new(OpenAiBackend::new("gpt-4o")))
///     .tool(Arc::new(CalculatorTool))
///     .max_tool_rounds(5)
///     .build()
///     .expect("backend is set");
/// ```
pub struct AgentBuilder {
    backend:       Option<Box<dyn LlmBackend>>,
    memory:        Option<Box<dyn HistoryStore>>,
    tools:         ToolRegistry,
    system_prompt: String,
    config:        AgentConfig,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            backend:       None,
            memory:        None,
            tools:         ToolRegistry::new(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            config:        AgentConfig::default(),
        }
    }

    /// The reasoning backend. Required.
    pub fn backend(mut self, backend: Box<dyn LlmBackend>) -> Self {
        self.backend = Some(backend); self
    }

    /// History store. Defaults to an in-memory [`VolatileMemory`].
    pub fn memory(mut self, memory: Box<dyn HistoryStore>) -> Self {
        self.memory = Some(memory); self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into(); self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.register(tool); self
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config; self
    }

    pub fn max_tool_rounds(mut self, n: usize) -> Self {
        self.config.max_tool_rounds = n; self
    }

    /// Execute multi-call batches concurrently (observations still appended
    /// in request order).
    pub fn parallel_tools(mut self, enabled: bool) -> Self {
        self.config.parallel_tools = enabled; self
    }

    pub fn build(self) -> Result<Agent, AgentError> {
        let backend = self
            .backend
            .ok_or_else(|| AgentError::Build("a reasoning backend is required".to_string()))?;
        let memory = self
            .memory
            .unwrap_or_else(|| Box::new(VolatileMemory::new()));

        Ok(Agent::new(
            backend,
            memory,
            self.tools,
            self.system_prompt,
            self.config,
        ))
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedBackend;
    use crate::types::Message;

    #[test]
    fn build_without_backend_fails() {
        let err = AgentBuilder::new().build().unwrap_err();
        assert!(matches!(err, AgentError::Build(_)));
    }

    #[test]
    fn build_seeds_system_prompt() {
        let agent = AgentBuilder::new()
            .backend(Box::new(ScriptedBackend::new(vec![])))
            .system_prompt("be terse")
            .build()
            .unwrap();
        assert_eq!(agent.history(), vec![Message::system("be terse")]);
    }
}
