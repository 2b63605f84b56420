//! ThreadStore trait — persisted conversations keyed by demonstration.
//!
//! A store holds one whole [`Thread`] per key. It is read once when a session
//! starts and overwritten wholesale after each completed exchange; writes are
//! atomic only at the granularity of the whole record and the last writer
//! wins.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::message::Thread;

/// The demonstrations whose conversations are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemoId {
    /// Multi-turn conversation
    Section2,
    /// Tool calling
    Section3,
    /// Autonomous agent
    Section4,
}

impl DemoId {
    pub const ALL: [DemoId; 3] = [DemoId::Section2, DemoId::Section3, DemoId::Section4];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Section2 => "section2",
            Self::Section3 => "section3",
            Self::Section4 => "section4",
        }
    }
}

impl std::fmt::Display for DemoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DemoId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "section2" | "2" | "chat" => Ok(Self::Section2),
            "section3" | "3" | "tools" => Ok(Self::Section3),
            "section4" | "4" | "agent" => Ok(Self::Section4),
            other => Err(format!(
                "unknown demonstration '{other}' (expected section2, section3 or section4)"
            )),
        }
    }
}

/// The core ThreadStore trait.
///
/// Implementations: JSON file, in-memory (for testing).
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// The backend name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// Load the thread stored under `key`; an absent record is an empty thread.
    async fn load(&self, key: DemoId) -> Result<Thread, StoreError>;

    /// Replace the whole record under `key`.
    async fn save(&self, key: DemoId, thread: &Thread) -> Result<(), StoreError>;

    /// Reset the record under `key` to an empty thread.
    async fn clear(&self, key: DemoId) -> Result<(), StoreError>;
}
