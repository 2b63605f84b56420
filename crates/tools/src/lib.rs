//! Network-backed tool implementations for threadloop.
//!
//! Tools give the model access to the outside world: current weather,
//! subreddit posts, programming jokes, and generated meme images.
//! Each tool keeps its own failure policy; see the module docs.

mod http;
pub mod image;
pub mod reddit;
pub mod weather;

use threadloop_config::AppConfig;
use threadloop_core::tool::ToolRegistry;

pub use image::MemeImageTool;
pub use reddit::{RedditJokeTool, RedditPostTool};
pub use weather::WeatherTool;

/// Tools for the interactive tool-calling conversation.
pub fn conversation_registry(config: &AppConfig) -> ToolRegistry {
    let timeout = config.tools.request_timeout_secs;
    ToolRegistry::new()
        .with(RedditPostTool::new(timeout))
        .with(WeatherTool::new(&config.tools.openweather_api_key, timeout))
}

/// Tools for the autonomous meme workflow.
pub fn meme_registry(config: &AppConfig) -> ToolRegistry {
    let timeout = config.tools.request_timeout_secs;
    ToolRegistry::new()
        .with(RedditJokeTool::new(timeout))
        .with(MemeImageTool::new(
            &config.base_url,
            config.api_key.clone().unwrap_or_default(),
            &config.tools.image_model,
            &config.tools.image_size,
            timeout,
        ))
}
