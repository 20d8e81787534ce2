//! Tool registry.
//!
//! Populated once at startup and read-only afterwards; discovery lists
//! tools in registration order.

use crate::error::{Result, ToolError};
use crate::protocol::{CallToolParams, CallToolResult, Tool};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn definition(&self) -> Tool;
    async fn execute(&self, arguments: Value) -> Result<CallToolResult>;
}

pub struct ToolRegistry {
    tools: DashMap<String, Arc<dyn ToolHandler>>,
    order: RwLock<Vec<String>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
            order: RwLock::new(Vec::new()),
        }
    }

    pub fn register<T: ToolHandler + 'static>(&self, tool: T) {
        let definition = tool.definition();
        let name = definition.name.clone();
        debug!("Registering tool: {}", name);
        if self.tools.insert(name.clone(), Arc::new(tool)).is_none() {
            self.order.write().push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).map(|entry| Arc::clone(&*entry))
    }

    /// Tool definitions in registration order.
    pub fn list(&self) -> Vec<Tool> {
        self.order
            .read()
            .iter()
            .filter_map(|name| self.tools.get(name).map(|entry| entry.definition()))
            .collect()
    }

    pub async fn execute(&self, params: CallToolParams) -> Result<CallToolResult> {
        let tool = self
            .get(&params.name)
            .ok_or_else(|| ToolError::NotFound(params.name.clone()))?;

        tool.execute(params.arguments).await
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

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedTool(&'static str);

    #[async_trait]
    impl ToolHandler for NamedTool {
        fn definition(&self) -> Tool {
            Tool {
                name: self.0.into(),
                description: Some(format!("The {} tool", self.0)),
                input_schema: serde_json::json!({"type": "object", "properties": {}}),
            }
        }

        async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
            Ok(CallToolResult::text(self.0))
        }
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ToolRegistry::new();
        registry.register(NamedTool("alpha"));

        assert_eq!(registry.len(), 1);
        assert!(registry.get("alpha").is_some());
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let registry = ToolRegistry::new();
        registry.register(NamedTool("zulu"));
        registry.register(NamedTool("alpha"));
        registry.register(NamedTool("mike"));

        let names: Vec<String> = registry.list().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["zulu", "alpha", "mike"]);

        // Stable across repeated calls.
        let again: Vec<String> = registry.list().into_iter().map(|t| t.name).collect();
        assert_eq!(names, again);
    }

    #[test]
    fn test_reregistration_keeps_single_listing() {
        let registry = ToolRegistry::new();
        registry.register(NamedTool("alpha"));
        registry.register(NamedTool("alpha"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.list().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let registry = ToolRegistry::new();
        let params = CallToolParams {
            name: "missing".into(),
            arguments: serde_json::json!({}),
        };

        let err = registry.execute(params).await.unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[tokio::test]
    async fn test_execute() {
        let registry = ToolRegistry::new();
        registry.register(NamedTool("alpha"));

        let params = CallToolParams {
            name: "alpha".into(),
            arguments: serde_json::json!({}),
        };

        let result = registry.execute(params).await.unwrap();
        assert!(result.is_error.is_none());
    }
}
