//! Interactive chat with a calculator-equipped agent.
//!
//! Requires OPENAI_API_KEY. Run with:
//!   cargo run --example basic_agent

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use cognicore::{AgentBuilder, CalculatorTool, OpenAiBackend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut agent = AgentBuilder::new()
        .backend(Box::new(OpenAiBackend::new("gpt-4o-mini")))
        .system_prompt(
            "You are a helpful assistant. Use the calculator tool for any arithmetic.",
        )
        .tool(Arc::new(CalculatorTool))
        .max_tool_rounds(5)
        .build()?;

    println!("Chat with the agent (it has a calculator). Type 'exit' to quit.\n");

    let stdin = io::stdin();
    loop {
        print!("you> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" {
            break;
        }

        match agent.chat(input).await {
            Ok(answer) => println!("agent> {}\n", answer),
            Err(e) => eprintln!("turn failed: {}\n", e),
        }
    }

    Ok(())
}
