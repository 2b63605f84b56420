//! `threadloop ask` — one-shot request/response.

use threadloop_agent::OneShotRequest;

use super::CommandResult;

pub async fn run(
    message: String,
    system: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
) -> CommandResult {
    let config = super::load_config()?;
    let provider = super::provider(&config)?;

    let request = OneShotRequest {
        model: model.unwrap_or_else(|| config.default_model.clone()),
        message,
        system_prompt: system,
        max_output_tokens: max_tokens.unwrap_or(config.max_output_tokens),
    };

    println!("Request:");
    println!("{}", serde_json::to_string_pretty(&request.to_request())?);
    println!();

    let summary = request.send(provider.as_ref()).await?;

    println!("Response:");
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
