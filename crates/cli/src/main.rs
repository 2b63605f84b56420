//! threadloop CLI — the main entry point.
//!
//! Commands:
//! - `ask`     — One-shot request/response
//! - `chat`    — Multi-turn conversation with persisted history
//! - `tools`   — Conversation with weather and subreddit tools
//! - `agent`   — Autonomous meme-making agent
//! - `history` — Show a stored conversation
//! - `clear`   — Forget a stored conversation

use clap::{Parser, Subcommand};
use threadloop_core::DemoId;

mod commands;

#[derive(Parser)]
#[command(
    name = "threadloop",
    about = "threadloop — conversation, tool-calling and agent demonstrations",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single request and show the raw exchange
    Ask {
        /// The user message
        message: String,

        /// System prompt sent ahead of the message
        #[arg(short, long, default_value = threadloop_agent::oneshot::DEFAULT_SYSTEM_PROMPT)]
        system: String,

        /// Send the message alone, without a system prompt
        #[arg(long, conflicts_with = "system")]
        no_system: bool,

        /// Override the configured model
        #[arg(short, long)]
        model: Option<String>,

        /// Output token cap
        #[arg(long)]
        max_tokens: Option<u32>,
    },

    /// Continue the persisted multi-turn conversation
    Chat {
        /// The user message
        message: String,
    },

    /// Continue the persisted tool-calling conversation
    Tools {
        /// The user message
        message: String,
    },

    /// Run the autonomous meme agent
    Agent,

    /// Show a stored conversation (section2, section3 or section4), or
    /// summarize all of them
    History {
        demo: Option<DemoId>,
    },

    /// Clear a stored conversation (section2, section3 or section4)
    Clear {
        demo: DemoId,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ask {
            message,
            system,
            no_system,
            model,
            max_tokens,
        } => {
            let system = (!no_system).then_some(system);
            commands::ask::run(message, system, model, max_tokens).await?
        }
        Commands::Chat { message } => commands::chat::run(&message).await?,
        Commands::Tools { message } => commands::tools::run(&message).await?,
        Commands::Agent => commands::agent::run().await?,
        Commands::History { demo: Some(demo) } => commands::history::show(demo).await?,
        Commands::History { demo: None } => commands::history::summary().await?,
        Commands::Clear { demo } => commands::history::clear(demo).await?,
    }

    Ok(())
}
