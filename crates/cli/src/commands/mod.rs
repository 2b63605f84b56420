pub mod agent;
pub mod ask;
pub mod chat;
pub mod history;
pub mod tools;

use std::sync::Arc;

use threadloop_config::AppConfig;
use threadloop_core::step::{AgentStep, StepKind};
use threadloop_core::{Message, Provider, Role};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Build the provider, explaining how to configure a key when none is set.
pub fn provider(config: &AppConfig) -> Result<Arc<dyn Provider>, Box<dyn std::error::Error>> {
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    THREADLOOP_API_KEY=sk-...");
        eprintln!("    OPENAI_API_KEY=sk-...");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
    }
    Ok(threadloop_providers::build_from_config(config)?)
}

pub fn print_step(step: &AgentStep) {
    let icon = match step.kind {
        StepKind::Thinking => "💭",
        StepKind::ToolCall => "🔧",
        StepKind::ToolResult => "📦",
        StepKind::Response => "✅",
    };
    println!("  {icon} [{}] {}", step.kind, step.content);
    if let Some(args) = &step.tool_args {
        println!("       args:   {args}");
    }
    if let Some(result) = &step.tool_result {
        println!("       result: {result}");
    }
}

pub fn print_message(message: &Message) {
    let label = match message.role {
        Role::User => "You",
        Role::Assistant => "Assistant",
        Role::System => "System",
        Role::Tool => "Tool",
    };
    let time = message.timestamp.format("%H:%M:%S");

    match (&message.name, message.tool_calls.is_empty()) {
        (Some(name), _) => println!("  [{time}] {label} ({name}) > {}", message.content),
        (None, false) => {
            let names: Vec<&str> = message.tool_calls.iter().map(|c| c.name()).collect();
            println!("  [{time}] {label} > (calling {})", names.join(", "));
            if !message.content.is_empty() {
                println!("      {}", message.content);
            }
        }
        (None, true) => println!("  [{time}] {label} > {}", message.content),
    }
}
