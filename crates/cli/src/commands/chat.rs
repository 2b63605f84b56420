//! `threadloop chat` — multi-turn conversation with persisted history.

use threadloop_agent::ConversationSession;

use super::CommandResult;

pub async fn run(message: &str) -> CommandResult {
    let config = super::load_config()?;
    let provider = super::provider(&config)?;
    let store = threadloop_store::build_from_config(&config);

    let mut session = ConversationSession::chat(provider, store, &config.default_model).await?;
    let history = session.thread().len();

    match session.send(message).await {
        Ok(exchange) => {
            println!("{}", exchange.reply);
            println!();
            println!(
                "  ({} messages in history, running total: {} tokens)",
                history + 2,
                session.total_usage().total()
            );
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
