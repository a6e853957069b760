//! Run a small behavioral test suite against a fully scripted agent.
//!
//! No network access needed. Run with:
//!   cargo run --example simulation

use std::sync::Arc;

use cognicore::{
    AgentBuilder, CalculatorTool, LlmResponse, ResponseContainsAssertion, Scenario,
    ScriptedBackend, Simulator, ToolCall, ToolUsedAssertion,
};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Script the backend: one tool round, a final answer, then a plain
    // greeting for the second scenario.
    let backend = ScriptedBackend::new(vec![
        LlmResponse::tool_calls(vec![ToolCall::new(
            "call_1",
            "calculator",
            json!({ "tool_input": "150 / 10" }).to_string(),
        )]),
        LlmResponse::answer("150 divided by 10 is 15.0."),
        LlmResponse::answer("Hello there!"),
    ]);

    let mut agent = AgentBuilder::new()
        .backend(Box::new(backend))
        .tool(Arc::new(CalculatorTool))
        .build()?;

    let scenarios = vec![
        Scenario::new(
            "division uses the calculator",
            vec!["What is 150 divided by 10?".to_string()],
            vec![
                Box::new(ToolUsedAssertion::new("calculator")),
                Box::new(ResponseContainsAssertion::new("15")),
            ],
        ),
        Scenario::new(
            "greeting should not calculate",
            vec!["Hi".to_string()],
            vec![Box::new(ToolUsedAssertion::new("calculator"))],
        ),
    ];

    let results = Simulator::new().run(&mut agent, &scenarios).await?;

    for result in &results {
        let verdict = if result.passed { "PASS" } else { "FAIL" };
        println!("[{}] {}", verdict, result.scenario_name);
        for (label, ok) in &result.assertion_results {
            println!("    {} {}", if *ok { "✓" } else { "✗" }, label);
        }
        if let Some(err) = &result.error {
            println!("    aborted: {}", err);
        }
    }

    Ok(())
}
