//! The composite result of an agent run, assembled from tool results.

use serde::Serialize;
use std::collections::BTreeMap;
use threadloop_core::tool::ArtifactSlot;

/// Named slots filled by each tool's artifact mapping. A later result for
/// the same slot replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Artifact {
    slots: BTreeMap<String, String>,
}

impl Artifact {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill(&mut self, slot: ArtifactSlot) {
        self.slots.insert(slot.name, slot.value);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.slots.get(name).map(String::as_str)
    }

    /// True when every named slot holds a non-empty value.
    pub fn has_all<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names
            .iter()
            .all(|n| self.get(n.as_ref()).is_some_and(|v| !v.is_empty()))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
