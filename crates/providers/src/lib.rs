//! Completion endpoint clients for threadloop.
//!
//! All providers implement the `threadloop_core::Provider` trait.

pub mod openai_compat;

use std::sync::Arc;

use threadloop_core::{CompletionError, Provider};

pub use openai_compat::OpenAiCompatProvider;

/// Build the provider described by the configuration.
///
/// Fails with `NotConfigured` when no API key is available.
pub fn build_from_config(
    config: &threadloop_config::AppConfig,
) -> Result<Arc<dyn Provider>, CompletionError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        CompletionError::NotConfigured(
            "no API key; set THREADLOOP_API_KEY or OPENAI_API_KEY, or api_key in config.toml".into(),
        )
    })?;

    tracing::debug!(base_url = %config.base_url, model = %config.default_model, "Building provider");
    Ok(Arc::new(OpenAiCompatProvider::new(
        "openai",
        &config.base_url,
        api_key,
    )))
}
