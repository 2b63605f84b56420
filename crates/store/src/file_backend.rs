//! File-based conversation store — one JSON document for all demonstrations.
//!
//! The file holds a JSON object keyed by demonstration id, each value being
//! the thread as an array of messages:
//!
//! ```json
//! { "section2": [ {"role":"user","content":"hi","timestamp":1700000000000} ] }
//! ```
//!
//! Storage location: `~/.threadloop/conversations.json`

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use threadloop_core::error::StoreError;
use threadloop_core::{DemoId, Thread, ThreadStore};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// A file-backed thread store.
///
/// Records are loaded on creation and the whole file is rewritten on every
/// mutation (save, clear). Records are kept as raw JSON until loaded so one
/// bad record does not take the others down with it.
pub struct FileThreadStore {
    path: PathBuf,
    records: Arc<RwLock<BTreeMap<String, serde_json::Value>>>,
}

impl FileThreadStore {
    /// Create a new file-based store at the given path.
    ///
    /// If the file does not exist, starts empty (file created on first write).
    /// An unreadable document is logged and treated as empty.
    pub fn new(path: PathBuf) -> Self {
        let records = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = records.len(), "File thread store loaded");
        Self {
            path,
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> BTreeMap<String, serde_json::Value> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return BTreeMap::new(),
        };
        if content.trim().is_empty() {
            return BTreeMap::new();
        }

        match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Conversation file is not a JSON object, starting empty");
                BTreeMap::new()
            }
        }
    }

    /// Write every record to disk as one pretty-printed document.
    async fn flush(&self) -> Result<(), StoreError> {
        let records = self.records.read().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Storage(format!("Failed to create store directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(&*records)
            .map_err(|e| StoreError::Storage(format!("Failed to serialize conversations: {e}")))?;

        std::fs::write(&self.path, content)
            .map_err(|e| StoreError::Storage(format!("Failed to write conversation file: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl ThreadStore for FileThreadStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self, key: DemoId) -> Result<Thread, StoreError> {
        let records = self.records.read().await;
        let Some(raw) = records.get(key.as_str()) else {
            return Ok(Thread::new());
        };

        let thread: Thread =
            serde_json::from_value(raw.clone()).map_err(|e| StoreError::Corrupted {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        thread.validate().map_err(|e| StoreError::Corrupted {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        debug!(key = %key, messages = thread.len(), "Loaded conversation");
        Ok(thread)
    }

    async fn save(&self, key: DemoId, thread: &Thread) -> Result<(), StoreError> {
        let value = serde_json::to_value(thread)
            .map_err(|e| StoreError::Storage(format!("Failed to serialize thread: {e}")))?;
        self.records.write().await.insert(key.to_string(), value);
        self.flush().await?;
        debug!(key = %key, messages = thread.len(), "Saved conversation");
        Ok(())
    }

    async fn clear(&self, key: DemoId) -> Result<(), StoreError> {
        self.records.write().await.remove(key.as_str());
        self.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use threadloop_core::{Message, ToolCall};

    fn temp_path() -> PathBuf {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        drop(tmp); // Close file so the store can use it
        path
    }

    fn tool_exchange() -> Thread {
        Thread::new()
            .with(Message::user("Weather in Paris and a post from r/rust?"))
            .with(Message::assistant_with_tool_calls(
                "",
                vec![
                    ToolCall::new("call_1", "get_weather", r#"{"city":"Paris"}"#),
                    ToolCall::new("call_2", "get_reddit_post", r#"{"subreddit":"rust"}"#),
                ],
            ))
            .with(Message::tool_result(
                "call_1",
                "get_weather",
                r#"{"temperature":22,"description":"partly cloudy","humidity":65,"city":"Paris"}"#,
            ))
            .with(Message::tool_result(
                "call_2",
                "get_reddit_post",
                r#"{"title":"Rust 2024","author":"ferris","score":100}"#,
            ))
            .with(Message::assistant("It is 22°C in Paris, and r/rust is talking about Rust 2024."))
    }

    #[tokio::test]
    async fn save_and_reload_persists() {
        let path = temp_path();
        let thread = tool_exchange();

        let store = FileThreadStore::new(path.clone());
        store.save(DemoId::Section3, &thread).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"section3\""));
        assert!(content.contains("toolCallId"));

        // Reload from disk — a fresh store sees an equal thread
        let store2 = FileThreadStore::new(path);
        let loaded = store2.load(DemoId::Section3).await.unwrap();
        assert_eq!(loaded, thread);
        assert!(store2.load(DemoId::Section2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let path = temp_path();
        let store = FileThreadStore::new(path.clone());
        store
            .save(DemoId::Section2, &Thread::new().with(Message::user("chat")))
            .await
            .unwrap();
        store.save(DemoId::Section3, &tool_exchange()).await.unwrap();
        store.clear(DemoId::Section2).await.unwrap();

        let store2 = FileThreadStore::new(path);
        assert!(store2.load(DemoId::Section2).await.unwrap().is_empty());
        assert_eq!(store2.load(DemoId::Section3).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn last_writer_wins() {
        let path = temp_path();
        let store = FileThreadStore::new(path.clone());
        store.save(DemoId::Section2, &Thread::new().with(Message::user("one"))).await.unwrap();
        store.save(DemoId::Section2, &Thread::new().with(Message::user("two"))).await.unwrap();

        let loaded = FileThreadStore::new(path).load(DemoId::Section2).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.messages()[0].content, "two");
    }

    #[tokio::test]
    async fn handles_missing_file_gracefully() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileThreadStore::new(dir.path().join("nested").join("conversations.json"));
        assert!(store.load(DemoId::Section4).await.unwrap().is_empty());

        // First write creates the parent directory
        store.save(DemoId::Section4, &Thread::new().with(Message::user("hi"))).await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn handles_corrupted_document() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "this is not json").unwrap();
        let store = FileThreadStore::new(tmp.path().to_path_buf());
        assert!(store.load(DemoId::Section2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupted_record_is_reported_per_key() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"{{"section2": "not a thread", "section3": [{{"role":"user","content":"ok","timestamp":1700000000000}}]}}"#
        )
        .unwrap();
        let store = FileThreadStore::new(tmp.path().to_path_buf());

        let err = store.load(DemoId::Section2).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupted { ref key, .. } if key == "section2"));
        assert_eq!(store.load(DemoId::Section3).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn orphan_tool_result_is_corrupted() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"{{"section3": [{{"role":"tool","content":"{{}}","toolCallId":"call_x","timestamp":1700000000000}}]}}"#
        )
        .unwrap();
        let store = FileThreadStore::new(tmp.path().to_path_buf());
        assert!(matches!(
            store.load(DemoId::Section3).await,
            Err(StoreError::Corrupted { .. })
        ));
    }
}
