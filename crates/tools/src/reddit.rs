//! Reddit tools — a random weekly-top post, and a programming joke.
//!
//! The two tools deliberately differ in failure policy: `get_reddit_post`
//! reports upstream failures to the caller, `get_reddit_joke` falls back to a
//! fixed joke.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::json;
use threadloop_core::error::ToolError;
use threadloop_core::tool::{ArtifactSlot, Tool};
use tracing::{debug, warn};

use crate::http;

const DEFAULT_BASE_URL: &str = "https://www.reddit.com";

/// Longest selftext still considered a joke rather than an essay.
const MAX_JOKE_LEN: usize = 500;

#[derive(Debug, Clone, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Clone, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Clone, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Clone, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    url: String,
}

/// Fetch `/r/{subreddit}/top.json` for the past week.
async fn fetch_top(
    client: &reqwest::Client,
    base_url: &str,
    subreddit: &str,
    limit: u32,
) -> Result<Vec<Post>, ToolError> {
    let request = client
        .get(format!("{base_url}/r/{subreddit}/top.json"))
        .query(&[("limit", limit.to_string()), ("t", "week".to_string())]);
    let body = http::send_json(request).await?;
    let listing: Listing = serde_json::from_value(body)
        .map_err(|e| ToolError::Upstream(format!("unexpected listing shape: {e}")))?;
    Ok(listing.data.children.into_iter().map(|c| c.data).collect())
}

pub struct RedditPostTool {
    client: reqwest::Client,
    base_url: String,
}

impl RedditPostTool {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            client: http::client(timeout_secs),
            base_url: DEFAULT_BASE_URL.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Pick one post at random; `content` is the selftext, or the link for link posts.
fn pick_post(posts: &[Post]) -> Option<serde_json::Value> {
    let post = posts.choose(&mut rand::thread_rng())?;
    let content = if post.selftext.is_empty() {
        &post.url
    } else {
        &post.selftext
    };
    Some(json!({
        "title": post.title,
        "content": content,
        "url": post.url,
    }))
}

#[async_trait]
impl Tool for RedditPostTool {
    fn name(&self) -> &str {
        "get_reddit_post"
    }

    fn description(&self) -> &str {
        "Fetch a random post from a specified subreddit"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "subreddit": {
                    "type": "string",
                    "description": "The subreddit name (without r/)"
                }
            },
            "required": ["subreddit"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let subreddit = arguments["subreddit"]
            .as_str()
            .map(|s| s.trim().trim_start_matches("r/"))
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'subreddit' argument".into()))?;

        let posts = fetch_top(&self.client, &self.base_url, subreddit, 25)
            .await
            .map_err(|e| ToolError::Upstream(format!("Failed to fetch Reddit post: {e}")))?;
        debug!(subreddit, count = posts.len(), "Fetched subreddit listing");

        pick_post(&posts).ok_or_else(|| {
            ToolError::Upstream(format!("Failed to fetch Reddit post: no posts found in r/{subreddit}"))
        })
    }
}

pub struct RedditJokeTool {
    client: reqwest::Client,
    base_url: String,
}

impl RedditJokeTool {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            client: http::client(timeout_secs),
            base_url: DEFAULT_BASE_URL.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

pub fn fallback_joke() -> serde_json::Value {
    json!({
        "setup": "Why do programmers prefer dark mode?",
        "punchline": "Because light attracts bugs!",
    })
}

/// Prefer short text posts; otherwise use any post's title, with its
/// selftext or a pointer to the image as the punchline.
fn pick_joke(posts: &[Post]) -> Option<serde_json::Value> {
    let mut rng = rand::thread_rng();
    let jokes: Vec<&Post> = posts
        .iter()
        .filter(|p| !p.selftext.is_empty() && p.selftext.chars().count() < MAX_JOKE_LEN)
        .collect();

    if let Some(joke) = jokes.choose(&mut rng) {
        return Some(json!({ "setup": joke.title, "punchline": joke.selftext }));
    }

    let post = posts.choose(&mut rng)?;
    let punchline = if post.selftext.is_empty() {
        "Check the image!"
    } else {
        post.selftext.as_str()
    };
    Some(json!({ "setup": post.title, "punchline": punchline }))
}

#[async_trait]
impl Tool for RedditJokeTool {
    fn name(&self) -> &str {
        "get_reddit_joke"
    }

    fn description(&self) -> &str {
        "Fetch a programming joke from r/ProgrammerHumor"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        match fetch_top(&self.client, &self.base_url, "ProgrammerHumor", 100).await {
            Ok(posts) => match pick_joke(&posts) {
                Some(joke) => Ok(joke),
                None => {
                    warn!("r/ProgrammerHumor listing was empty, using fallback joke");
                    Ok(fallback_joke())
                }
            },
            Err(e) => {
                warn!(error = %e, "Joke lookup failed, using fallback joke");
                Ok(fallback_joke())
            }
        }
    }

    fn artifact_slots(&self, result: &serde_json::Value) -> Vec<ArtifactSlot> {
        match (result["setup"].as_str(), result["punchline"].as_str()) {
            (Some(setup), Some(punchline)) => {
                vec![ArtifactSlot::new("joke", format!("{setup}\n\n{punchline}"))]
            }
            _ => Vec::new(),
        }
    }
}
