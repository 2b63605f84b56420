//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools give the model access to the outside world: current weather, forum
//! posts, image generation. Each tool declares a JSON schema the model sees,
//! executes against structured arguments, and may declare how its result
//! feeds the composite artifact of an agent run.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// One named piece of a run's final artifact, produced from a tool result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSlot {
    pub name: String,
    pub value: String,
}

impl ArtifactSlot {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The core Tool trait.
///
/// The registry does not validate arguments against the schema; a tool that
/// receives the wrong shape reports `ToolError::InvalidArguments` itself.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "get_weather").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError>;

    /// Map a successful result into artifact slots. Most tools contribute nothing.
    fn artifact_slots(&self, _result: &serde_json::Value) -> Vec<ArtifactSlot> {
        Vec::new()
    }

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// Tools keep their registration order so the schema list sent to the model
/// is deterministic. The registry adds no ordering or concurrency control of
/// its own.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name in place.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&slot) => self.tools[slot] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Builder-style register.
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.register(Box::new(tool));
        self
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&slot| self.tools[slot].as_ref())
    }

    /// Get all tool definitions (for sending to the LLM), in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Invoke a tool by name.
    ///
    /// Fails with `UnknownTool` when nothing is registered under `name`; any
    /// failure of the tool itself comes back as `Execution`.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(arguments).await.map_err(|e| match e {
            ToolError::Execution { .. } => e,
            other => ToolError::Execution {
                tool_name: name.to_string(),
                cause: other.to_string(),
            },
        })
    }

    /// Artifact slots the named tool derives from `result`.
    pub fn artifact_slots(&self, name: &str, result: &serde_json::Value) -> Vec<ArtifactSlot> {
        self.get(name)
            .map(|t| t.artifact_slots(result))
            .unwrap_or_default()
    }

    /// List all registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
