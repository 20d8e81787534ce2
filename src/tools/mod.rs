//! MCP tool definitions and registry.

pub mod characters;
pub mod comics;
pub mod registry;

pub use characters::{GetCharacterByIdTool, GetCharactersForComicTool, GetCharactersTool};
pub use comics::{GetComicByIdTool, GetComicsForCharacterTool, GetComicsTool};
pub use registry::{ToolHandler, ToolRegistry};

use crate::error::{Result, ToolError};
use crate::marvel::MarvelClient;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Create and register all tools, in the order discovery lists them.
pub fn create_registry(client: Arc<MarvelClient>) -> ToolRegistry {
    let registry = ToolRegistry::new();

    registry.register(GetCharactersTool::new(Arc::clone(&client)));
    registry.register(GetCharacterByIdTool::new(Arc::clone(&client)));
    registry.register(GetComicsForCharacterTool::new(Arc::clone(&client)));
    registry.register(GetComicsTool::new(Arc::clone(&client)));
    registry.register(GetComicByIdTool::new(Arc::clone(&client)));
    registry.register(GetCharactersForComicTool::new(client));

    registry
}

/// Deserialize an argument bag into a typed struct. The serde error
/// names the offending field.
pub(crate) fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::InvalidArguments(e.to_string()).into())
}

/// Shared bound on the `limit` pagination parameter.
pub(crate) fn check_limit(limit: Option<u32>) -> Result<()> {
    if let Some(limit) = limit {
        if !(1..=100).contains(&limit) {
            return Err(ToolError::InvalidArguments(format!(
                "limit must be between 1 and 100, got {}",
                limit
            ))
            .into());
        }
    }
    Ok(())
}
