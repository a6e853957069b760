//! Assemble a conversational agent from three swappable capabilities — a
//! reasoning backend, a history store, and a set of callable tools — then
//! drive a reason-act loop until the agent produces a final answer, and
//! verify its behavior by replaying scripted scenarios through the
//! simulator.

pub mod agent;
pub mod builder;
pub mod error;
pub mod llm;
pub mod memory;
pub mod simulation;
pub mod tools;
pub mod types;

// Convenience re-exports at crate root
pub use agent::{Agent, TurnState};
pub use builder::AgentBuilder;
pub use error::{AgentError, BackendError, SimulationError, ToolError};
pub use llm::{AnthropicBackend, LlmBackend, OpenAiBackend, RetryingBackend, ScriptedBackend};
pub use memory::{HistoryStore, SqliteMemory, VolatileMemory};
pub use simulation::{
    Assertion, ResponseContainsAssertion, Scenario, SimulationResult, Simulator,
    ToolUsedAssertion,
};
pub use tools::{CalculatorTool, Tool, ToolRegistry, ToolSchema};
pub use types::{AgentConfig, LlmResponse, Message, ToolCall};
