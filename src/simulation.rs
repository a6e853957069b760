use std::collections::{BTreeMap, HashSet};

use crate::agent::Agent;
use crate::error::SimulationError;
use crate::types::Message;

/// A rule evaluated against a finished transcript.
///
/// New assertion kinds only need this signature — there is no other
/// coupling. `label` identifies the assertion in
/// [`SimulationResult::assertion_results`]; keep it unique within one
/// scenario or later entries overwrite earlier ones.
pub trait Assertion: Send + Sync {
    fn label(&self) -> String;

    /// True if the transcript satisfies this assertion. Must not panic — a
    /// transcript that lacks what the assertion looks for is a `false`,
    /// not an error.
    fn evaluate(&self, transcript: &[Message]) -> bool;
}

/// Passes iff some assistant message requested the named tool, anywhere in
/// the transcript.
pub struct ToolUsedAssertion {
    tool_name: String,
}

impl ToolUsedAssertion {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self { tool_name: tool_name.into() }
    }
}

impl Assertion for ToolUsedAssertion {
    fn label(&self) -> String {
        format!("tool_used({})", self.tool_name)
    }

    fn evaluate(&self, transcript: &[Message]) -> bool {
        transcript
            .iter()
            .flat_map(|m| m.tool_calls())
            .any(|tc| tc.name == self.tool_name)
    }
}

/// Passes iff the last assistant message with non-null content contains the
/// expected text as a case-sensitive substring.
pub struct ResponseContainsAssertion {
    expected: String,
}

impl ResponseContainsAssertion {
    pub fn new(expected: impl Into<String>) -> Self {
        Self { expected: expected.into() }
    }
}

impl Assertion for ResponseContainsAssertion {
    fn label(&self) -> String {
        format!("response_contains({})", self.expected)
    }

    fn evaluate(&self, transcript: &[Message]) -> bool {
        transcript
            .iter()
            .rev()
            .find_map(|m| match m {
                Message::Assistant { content: Some(c), .. } => Some(c),
                _ => None,
            })
            .is_some_and(|c| c.contains(&self.expected))
    }
}

/// A scripted multi-step conversation plus the conditions it must satisfy.
/// Authored once, immutable, runnable against any number of agents.
pub struct Scenario {
    pub name:       String,
    pub steps:      Vec<String>,
    pub assertions: Vec<Box<dyn Assertion>>,
}

impl Scenario {
    pub fn new(
        name: impl Into<String>,
        steps: Vec<String>,
        assertions: Vec<Box<dyn Assertion>>,
    ) -> Self {
        Self { name: name.into(), steps, assertions }
    }
}

/// Outcome of running one scenario against one agent. Plain data, produced
/// fresh per run.
#[derive(Debug)]
pub struct SimulationResult {
    pub scenario_name: String,
    /// True iff every assertion passed and no turn died. An empty
    /// assertion set passes vacuously.
    pub passed: bool,
    /// Assertion label → outcome, in label order.
    pub assertion_results: BTreeMap<String, bool>,
    /// The final message history — partial if a turn died mid-scenario.
    pub transcript: Vec<Message>,
    /// The turn-fatal error that aborted this scenario, if any.
    pub error: Option<String>,
}

/// Replays scenarios against an agent and reports structured results.
///
/// Scenarios are isolated: the agent is reset before each one, so listed
/// order never affects outcomes. A turn-fatal error (`BackendError`,
/// `ToolLoopExceeded`) fails only its own scenario — the suite always
/// yields one result per input scenario.
#[derive(Debug, Default)]
pub struct Simulator;

impl Simulator {
    pub fn new() -> Self {
        Self
    }

    /// Run every scenario, in listed order, against the agent.
    ///
    /// Malformed input — duplicate scenario names — is rejected eagerly,
    /// before any scenario executes.
    pub async fn run(
        &self,
        agent: &mut Agent,
        scenarios: &[Scenario],
    ) -> Result<Vec<SimulationResult>, SimulationError> {
        let mut seen = HashSet::new();
        for scenario in scenarios {
            if !seen.insert(scenario.name.as_str()) {
                return Err(SimulationError::DuplicateScenario(scenario.name.clone()));
            }
        }

        let mut results = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            results.push(self.run_one(agent, scenario).await);
        }
        Ok(results)
    }

    async fn run_one(&self, agent: &mut Agent, scenario: &Scenario) -> SimulationResult {
        tracing::info!(scenario = %scenario.name, steps = scenario.steps.len(), "scenario start");
        agent.reset();

        let mut error = None;
        for step in &scenario.steps {
            if let Err(e) = agent.chat(step).await {
                tracing::warn!(scenario = %scenario.name, error = %e, "scenario aborted");
                error = Some(e.to_string());
                break;
            }
        }

        let transcript = agent.history();

        // Assertions are still evaluated over a partial transcript; it
        // helps triage why the scenario died. `passed` is false regardless.
        let assertion_results: BTreeMap<String, bool> = scenario
            .assertions
            .iter()
            .map(|a| (a.label(), a.evaluate(&transcript)))
            .collect();

        let passed = error.is_none() && assertion_results.values().all(|&ok| ok);
        tracing::info!(scenario = %scenario.name, passed, "scenario finished");

        SimulationResult {
            scenario_name: scenario.name.clone(),
            passed,
            assertion_results,
            transcript,
            error,
        }
    }
}
