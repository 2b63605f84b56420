//! `threadloop tools` — conversation with weather and subreddit tools.

use std::sync::Arc;
use threadloop_agent::{ConversationSession, DemoPreset, Termination};

use super::CommandResult;

pub async fn run(message: &str) -> CommandResult {
    let config = super::load_config()?;
    let provider = super::provider(&config)?;
    let store = threadloop_store::build_from_config(&config);
    let tools = Arc::new(DemoPreset::tool_conversation().registry(&config));

    let mut session =
        ConversationSession::with_tools(provider, store, tools, config.agent_config()).await?;

    let result = session.send(message).await;
    let steps = match &result {
        Ok(exchange) => &exchange.steps,
        Err(failure) => &failure.steps,
    };
    for step in steps.iter().filter(|s| s.tool_name.is_some()) {
        super::print_step(step);
    }
    println!();

    match result {
        Ok(exchange) if exchange.termination == Termination::IterationCapReached => {
            println!(
                "  The model stopped after {} iterations without a final answer.",
                exchange.iterations
            );
            Ok(())
        }
        Ok(exchange) => {
            println!("{}", exchange.reply);
            Ok(())
        }
        Err(failure) => {
            if let Some(last) = session.thread().last() {
                eprintln!("{}", last.content);
            }
            Err(failure.into())
        }
    }
}
