//! Weather tool — current conditions from OpenWeatherMap.
//!
//! Never fails: any transport error, bad status, or unexpected body yields a
//! fixed sample report for the requested city, and a call without a usable
//! `city` gets the same report for `"unknown"`.

use async_trait::async_trait;
use serde_json::json;
use threadloop_core::error::ToolError;
use threadloop_core::tool::Tool;
use tracing::{debug, warn};

use crate::http;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

pub struct WeatherTool {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WeatherTool {
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: http::client(timeout_secs),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
        }
    }

    /// Point the tool at another host (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch(&self, city: &str) -> Result<serde_json::Value, ToolError> {
        let request = self.client.get(format!("{}/weather", self.base_url)).query(&[
            ("q", city),
            ("appid", self.api_key.as_str()),
            ("units", "metric"),
        ]);
        let body = http::send_json(request).await?;

        let temperature = body["main"]["temp"].clone();
        let description = body["weather"][0]["description"].as_str();
        let humidity = body["main"]["humidity"].clone();
        match (temperature.is_number(), description, humidity.is_number()) {
            (true, Some(description), true) => Ok(json!({
                "temperature": temperature,
                "description": description,
                "humidity": humidity,
                "city": body["name"].as_str().unwrap_or(city),
            })),
            _ => Err(ToolError::Upstream("unexpected weather payload".into())),
        }
    }
}

/// The report used whenever the live lookup fails.
pub fn fallback_report(city: &str) -> serde_json::Value {
    json!({
        "temperature": 22,
        "description": "partly cloudy",
        "humidity": 65,
        "city": city,
    })
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get current weather information for a city"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "The city name"
                }
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let Some(city) = arguments["city"].as_str().filter(|c| !c.trim().is_empty()) else {
            warn!(arguments = %arguments, "Weather lookup without a city, using sample report");
            return Ok(fallback_report("unknown"));
        };

        match self.fetch(city).await {
            Ok(report) => {
                debug!(city, "Weather lookup succeeded");
                Ok(report)
            }
            Err(e) => {
                warn!(city, error = %e, "Weather lookup failed, using sample report");
                Ok(fallback_report(city))
            }
        }
    }
}
