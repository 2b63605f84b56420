//! `threadloop agent` — the autonomous meme workflow.

use std::sync::Arc;
use threadloop_agent::{AgentLoop, DemoPreset};

use super::CommandResult;

pub async fn run() -> CommandResult {
    let config = super::load_config()?;
    let provider = super::provider(&config)?;
    let preset = DemoPreset::meme_agent();
    let tools = Arc::new(preset.registry(&config));

    println!();
    println!("  Model:  {}", config.default_model);
    println!("  Tools:  {}", tools.names().join(", "));
    println!("  Budget: {} iterations", config.agent.max_iterations);
    println!();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let agent = AgentLoop::from_preset(provider, tools, config.agent_config(), &preset)
        .with_step_sender(tx);
    let run = tokio::spawn(agent.run());

    while let Some(step) = rx.recv().await {
        super::print_step(&step);
    }

    let outcome = run.await?;
    println!();

    if let Some(error) = outcome.error {
        return Err(error.into());
    }

    if outcome.artifact.has_all(&preset.required_slots) {
        println!("  ── Your programming meme ──");
        if let Some(joke) = outcome.artifact.get("joke") {
            for line in joke.lines() {
                println!("  {line}");
            }
        }
        if let Some(url) = outcome.artifact.get("image_url") {
            println!();
            println!("  Image: {url}");
        }
    } else {
        println!(
            "  The agent stopped after {} iterations without finishing the meme.",
            outcome.iterations
        );
    }
    println!();
    println!(
        "  ({} tool calls, {} tokens)",
        outcome.tool_calls_made,
        outcome.usage.total()
    );
    Ok(())
}
