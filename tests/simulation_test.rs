//! Integration tests for the simulator and assertion library.
//!
//! All tests use `ScriptedBackend` — no network calls are made.

use std::sync::Arc;

use cognicore::{
    Agent, AgentBuilder, BackendError, CalculatorTool, LlmResponse, Message,
    ResponseContainsAssertion, Scenario, ScriptedBackend, SimulationError, Simulator, ToolCall,
    ToolUsedAssertion,
};
use serde_json::json;

// ─────────────────────────────────────────────────────────────────────────────
// Test helpers
// ─────────────────────────────────────────────────────────────────────────────

fn tool_call(id: &str, name: &str, input: &str) -> ToolCall {
    ToolCall::new(id, name, json!({ "tool_input": input }).to_string())
}

fn agent_with(responses: Vec<LlmResponse>) -> Agent {
    AgentBuilder::new()
        .backend(Box::new(ScriptedBackend::new(responses)))
        .tool(Arc::new(CalculatorTool))
        .build()
        .expect("builder should succeed")
}

fn steps(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|s| s.to_string()).collect()
}

/// The script behind the calculator scenario: one tool round, then the
/// final answer built from the observation.
fn calculator_script() -> Vec<LlmResponse> {
    vec![
        LlmResponse::tool_calls(vec![tool_call("c1", "calculator", "150 / 10")]),
        LlmResponse::answer("150 divided by 10 is 15.0."),
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: the calculator scenario passes both built-in assertions
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn calculator_scenario_passes() {
    let mut agent = agent_with(calculator_script());
    let scenarios = vec![Scenario::new(
        "successful tool use",
        steps(&["What is 150 divided by 10?"]),
        vec![
            Box::new(ToolUsedAssertion::new("calculator")),
            Box::new(ResponseContainsAssertion::new("15")),
        ],
    )];

    let results = Simulator::new().run(&mut agent, &scenarios).await.unwrap();
    assert_eq!(results.len(), 1);

    let result = &results[0];
    assert_eq!(result.scenario_name, "successful tool use");
    assert!(result.passed);
    assert_eq!(result.assertion_results["tool_used(calculator)"], true);
    assert_eq!(result.assertion_results["response_contains(15)"], true);
    assert!(result.error.is_none());

    // The transcript carries the full exchange, observation included.
    assert!(result
        .transcript
        .contains(&Message::tool("c1", "calculator", "15.0")));
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: a failed assertion fails its scenario but not the suite
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn passing_and_failing_scenarios_report_accurately() {
    let mut responses = calculator_script();
    responses.push(LlmResponse::answer("Hello there!"));
    let mut agent = agent_with(responses);

    let scenarios = vec![
        Scenario::new(
            "tool use",
            steps(&["What is 150 divided by 10?"]),
            vec![
                Box::new(ToolUsedAssertion::new("calculator")),
                Box::new(ResponseContainsAssertion::new("15")),
            ],
        ),
        Scenario::new(
            "no tool use",
            steps(&["Hi"]),
            vec![
                Box::new(ToolUsedAssertion::new("calculator")),
                Box::new(ResponseContainsAssertion::new("world")),
            ],
        ),
    ];

    let results = Simulator::new().run(&mut agent, &scenarios).await.unwrap();
    assert_eq!(results.len(), 2);

    assert!(results[0].passed);
    assert!(!results[1].passed);
    assert_eq!(results[1].assertion_results["tool_used(calculator)"], false);
    assert_eq!(results[1].assertion_results["response_contains(world)"], false);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: empty assertion set passes vacuously
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_assertions_always_pass() {
    let mut agent = agent_with(vec![LlmResponse::answer("whatever")]);
    let scenarios = vec![Scenario::new("no assertions", steps(&["hello"]), vec![])];

    let results = Simulator::new().run(&mut agent, &scenarios).await.unwrap();
    assert!(results[0].passed);
    assert!(results[0].assertion_results.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: isolation — each scenario starts from a freshly cleared history
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn scenarios_are_isolated() {
    let mut agent = agent_with(vec![
        LlmResponse::answer("first scenario answer"),
        LlmResponse::answer("second scenario answer"),
    ]);

    let scenarios = vec![
        Scenario::new("first", steps(&["one"]), vec![]),
        Scenario::new("second", steps(&["two"]), vec![]),
    ];

    let results = Simulator::new().run(&mut agent, &scenarios).await.unwrap();

    // Nothing from scenario one leaks into scenario two's transcript: it
    // is exactly what a just-cleared agent would produce.
    assert_eq!(
        results[1].transcript,
        vec![
            Message::system("You are a helpful assistant."),
            Message::user("two"),
            Message::assistant("second scenario answer"),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 5: a turn-fatal error aborts only its own scenario
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fatal_error_fails_one_scenario_not_the_suite() {
    // Scenario one hits a scripted transport outage on its second step.
    // Scenario two still runs.
    let mut agent = AgentBuilder::new()
        .backend(Box::new(ScriptedBackend::with_results(vec![
            Ok(LlmResponse::answer("step one ok")),
            Err(BackendError::Transport("injected outage".to_string())),
            Ok(LlmResponse::answer("recovered")),
        ])))
        .tool(Arc::new(CalculatorTool))
        .build()
        .unwrap();

    let scenarios = vec![
        Scenario::new(
            "dies on step two",
            steps(&["first step", "second step"]),
            vec![Box::new(ResponseContainsAssertion::new("ok"))],
        ),
        Scenario::new(
            "healthy",
            steps(&["hello"]),
            vec![Box::new(ResponseContainsAssertion::new("recovered"))],
        ),
    ];

    let results = Simulator::new().run(&mut agent, &scenarios).await.unwrap();
    assert_eq!(results.len(), 2, "one result per scenario, always");

    let failed = &results[0];
    assert!(!failed.passed);
    assert!(failed.error.as_deref().unwrap().contains("injected outage"));
    // Partial transcript: the completed first step is retained.
    assert!(failed.transcript.contains(&Message::assistant("step one ok")));
    // Assertions were still evaluated over the partial transcript.
    assert_eq!(failed.assertion_results["response_contains(ok)"], true);

    assert!(results[1].passed, "later scenario unaffected by the failure");
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 6: a tool loop blow-up is contained the same way
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tool_loop_exceeded_is_contained() {
    // Two tool rounds hit the cap without a third reasoning call, so the
    // follow-up scenario gets the final scripted answer.
    let looping: Vec<LlmResponse> = (0..2)
        .map(|i| LlmResponse::tool_calls(vec![tool_call(&format!("c{}", i), "calculator", "1 + 1")]))
        .chain(std::iter::once(LlmResponse::answer("follow-up fine")))
        .collect();

    let mut agent = AgentBuilder::new()
        .backend(Box::new(ScriptedBackend::new(looping)))
        .tool(Arc::new(CalculatorTool))
        .max_tool_rounds(2)
        .build()
        .unwrap();

    let scenarios = vec![
        Scenario::new("loops", steps(&["loop"]), vec![]),
        Scenario::new("fine", steps(&["next"]), vec![]),
    ];

    let results = Simulator::new().run(&mut agent, &scenarios).await.unwrap();

    assert!(!results[0].passed, "fatal error forces failure even with no assertions");
    assert!(results[0].error.as_deref().unwrap().contains("tool loop exceeded"));
    // History retains the completed rounds, no synthetic answer.
    assert_eq!(results[0].transcript.last().unwrap().role(), "tool");

    assert!(results[1].passed);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 7: determinism — same scenario, same script, same result
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn identical_runs_yield_identical_results() {
    let mut outcomes = Vec::new();
    for _ in 0..2 {
        let mut agent = agent_with(calculator_script());
        let scenarios = vec![Scenario::new(
            "calc",
            steps(&["What is 150 divided by 10?"]),
            vec![
                Box::new(ToolUsedAssertion::new("calculator")),
                Box::new(ResponseContainsAssertion::new("15")),
            ],
        )];
        let results = Simulator::new().run(&mut agent, &scenarios).await.unwrap();
        outcomes.push(results);
    }

    let (a, b) = (&outcomes[0][0], &outcomes[1][0]);
    assert_eq!(a.scenario_name, b.scenario_name);
    assert_eq!(a.passed, b.passed);
    assert_eq!(a.assertion_results, b.assertion_results);
    assert_eq!(a.transcript, b.transcript);
    assert_eq!(a.error, b.error);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 8: duplicate scenario names are rejected before anything runs
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_scenario_names_rejected_eagerly() {
    let mut agent = agent_with(vec![LlmResponse::answer("never used")]);
    let scenarios = vec![
        Scenario::new("dup", steps(&["a"]), vec![]),
        Scenario::new("dup", steps(&["b"]), vec![]),
    ];

    let err = Simulator::new().run(&mut agent, &scenarios).await.unwrap_err();
    assert!(matches!(err, SimulationError::DuplicateScenario(name) if name == "dup"));

    // Rejected eagerly: the agent never ran a turn, so its history is
    // still whatever construction seeded.
    assert_eq!(agent.history().len(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 9: multi-step scenarios accumulate one transcript
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn multi_step_scenario_accumulates_history() {
    let mut agent = agent_with(vec![
        LlmResponse::answer("nice to meet you, Ada"),
        LlmResponse::answer("your name is Ada"),
    ]);

    let scenarios = vec![Scenario::new(
        "memory across steps",
        steps(&["My name is Ada", "What is my name?"]),
        vec![Box::new(ResponseContainsAssertion::new("Ada"))],
    )];

    let results = Simulator::new().run(&mut agent, &scenarios).await.unwrap();
    let result = &results[0];
    assert!(result.passed);

    // system + 2 × (user, assistant)
    assert_eq!(result.transcript.len(), 5);
    assert_eq!(result.transcript[1], Message::user("My name is Ada"));
    assert_eq!(result.transcript[3], Message::user("What is my name?"));
}
