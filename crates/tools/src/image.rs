//! Meme image tool — image generation through the OpenAI-compatible
//! `/images/generations` endpoint.

use async_trait::async_trait;
use serde_json::json;
use threadloop_core::error::ToolError;
use threadloop_core::tool::{ArtifactSlot, Tool};
use tracing::debug;

use crate::http;

pub struct MemeImageTool {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    size: String,
}

impl MemeImageTool {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        size: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: http::client(timeout_secs),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            size: size.into(),
        }
    }
}

#[async_trait]
impl Tool for MemeImageTool {
    fn name(&self) -> &str {
        "generate_meme_image"
    }

    fn description(&self) -> &str {
        "Generate a meme image using DALL-E based on a joke"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "Detailed prompt for generating a meme image that visualizes the joke"
                }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let prompt = arguments["prompt"].as_str().ok_or_else(|| {
            ToolError::InvalidArguments("Invalid arguments for generate_meme_image".into())
        })?;

        debug!(model = %self.model, prompt_len = prompt.len(), "Generating image");

        let request = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "n": 1,
                "size": self.size,
            }));
        let body = http::send_json(request).await?;

        let url = body["data"][0]["url"]
            .as_str()
            .ok_or_else(|| ToolError::Upstream("image response carried no URL".into()))?;

        Ok(json!({ "imageUrl": url }))
    }

    fn artifact_slots(&self, result: &serde_json::Value) -> Vec<ArtifactSlot> {
        result["imageUrl"]
            .as_str()
            .map(|url| vec![ArtifactSlot::new("image_url", url)])
            .unwrap_or_default()
    }
}
