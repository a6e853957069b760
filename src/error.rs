use thiserror::Error;

/// Failure inside the tool layer. Always recovered locally: the dispatcher
/// converts these into `tool`-role observation messages so the reasoning
/// backend can react, and never lets them abort the turn.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    Unknown(String),

    #[error("invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("tool '{tool}' failed: {reason}")]
    Execution { tool: String, reason: String },
}

impl ToolError {
    pub fn execution(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Execution { tool: tool.into(), reason: reason.into() }
    }
}

/// Failure of the reasoning backend. Turn-fatal: the agent propagates it to
/// the caller without retrying — retry policy, if any, belongs to the
/// backend implementation (see `RetryingBackend`).
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("backend transport error: {0}")]
    Transport(String),

    #[error("backend authentication failed: {0}")]
    Auth(String),

    #[error("malformed backend response: {0}")]
    Malformed(String),
}

/// Turn-level failure surfaced by `Agent::chat`.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("tool loop exceeded: {rounds} tool rounds (max {max})")]
    ToolLoopExceeded { rounds: usize, max: usize },

    #[error("agent build error: {0}")]
    Build(String),
}

/// Malformed simulation input, rejected eagerly before any scenario runs.
/// Turn-level failures during a run never surface here — they fail only
/// their own scenario's result.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("duplicate scenario name: '{0}'")]
    DuplicateScenario(String),
}
