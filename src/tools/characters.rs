//! Character lookup tools.

use crate::error::Result;
use crate::marvel::{CharacterFilters, MarvelClient};
use crate::protocol::{CallToolResult, Tool};
use crate::tools::registry::ToolHandler;
use crate::tools::{check_limit, parse_args};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// `get_characters` - list characters with optional filters.
pub struct GetCharactersTool {
    client: Arc<MarvelClient>,
}

impl GetCharactersTool {
    pub fn new(client: Arc<MarvelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetCharactersTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_characters".into(),
            description: Some("Fetch Marvel characters with optional filters.".into()),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Return only characters matching this full name."
                    },
                    "nameStartsWith": {
                        "type": "string",
                        "description": "Return characters whose name begins with this string."
                    },
                    "modifiedSince": {
                        "type": "string",
                        "description": "Return only characters modified since this date (ISO 8601)."
                    },
                    "comics": {
                        "type": "string",
                        "description": "Comma-separated comic ids the characters must appear in."
                    },
                    "series": {
                        "type": "string",
                        "description": "Comma-separated series ids the characters must appear in."
                    },
                    "events": {
                        "type": "string",
                        "description": "Comma-separated event ids the characters must appear in."
                    },
                    "stories": {
                        "type": "string",
                        "description": "Comma-separated story ids the characters must appear in."
                    },
                    "orderBy": {
                        "type": "string",
                        "description": "Sort order, e.g. name, modified, -name, -modified."
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Number of results to return.",
                        "minimum": 1,
                        "maximum": 100
                    },
                    "offset": {
                        "type": "integer",
                        "description": "Number of results to skip for pagination."
                    }
                }
            }),
        }
    }

    #[instrument(skip(self, arguments), fields(tool = "get_characters"))]
    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let filters: CharacterFilters = parse_args(arguments)?;
        check_limit(filters.limit)?;

        let wrapper = self.client.characters(&filters).await?;
        Ok(CallToolResult::json(&wrapper))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetCharacterByIdArgs {
    character_id: i64,
}

/// `get_character_by_id` - fetch one character.
pub struct GetCharacterByIdTool {
    client: Arc<MarvelClient>,
}

impl GetCharacterByIdTool {
    pub fn new(client: Arc<MarvelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetCharacterByIdTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_character_by_id".into(),
            description: Some("Fetch a Marvel character by ID.".into()),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "characterId": {
                        "type": "integer",
                        "description": "The unique ID of the character."
                    }
                },
                "required": ["characterId"]
            }),
        }
    }

    #[instrument(skip(self, arguments), fields(tool = "get_character_by_id"))]
    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: GetCharacterByIdArgs = parse_args(arguments)?;

        let wrapper = self.client.character_by_id(args.character_id).await?;
        Ok(CallToolResult::json(&wrapper))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetCharactersForComicArgs {
    comic_id: i64,
    #[serde(flatten)]
    filters: CharacterFilters,
}

/// `get_characters_for_comic` - characters appearing in a comic.
pub struct GetCharactersForComicTool {
    client: Arc<MarvelClient>,
}

impl GetCharactersForComicTool {
    pub fn new(client: Arc<MarvelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetCharactersForComicTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_characters_for_comic".into(),
            description: Some("Fetch Marvel characters for a given comic.".into()),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "comicId": {
                        "type": "integer",
                        "description": "The unique ID of the comic."
                    },
                    "name": {
                        "type": "string",
                        "description": "Return only characters matching this full name."
                    },
                    "nameStartsWith": {
                        "type": "string",
                        "description": "Return characters whose name begins with this string."
                    },
                    "modifiedSince": {
                        "type": "string",
                        "description": "Return only characters modified since this date (ISO 8601)."
                    },
                    "series": {
                        "type": "string",
                        "description": "Comma-separated series ids the characters must appear in."
                    },
                    "events": {
                        "type": "string",
                        "description": "Comma-separated event ids the characters must appear in."
                    },
                    "stories": {
                        "type": "string",
                        "description": "Comma-separated story ids the characters must appear in."
                    },
                    "orderBy": {
                        "type": "string",
                        "description": "Sort order, e.g. name, modified, -name, -modified."
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Number of results to return.",
                        "minimum": 1,
                        "maximum": 100
                    },
                    "offset": {
                        "type": "integer",
                        "description": "Number of results to skip for pagination."
                    }
                },
                "required": ["comicId"]
            }),
        }
    }

    #[instrument(skip(self, arguments), fields(tool = "get_characters_for_comic"))]
    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let mut args: GetCharactersForComicArgs = parse_args(arguments)?;
        check_limit(args.filters.limit)?;
        // Not part of this tool's parameter surface.
        args.filters.comics = None;

        let wrapper = self
            .client
            .characters_for_comic(args.comic_id, &args.filters)
            .await?;
        Ok(CallToolResult::json(&wrapper))
    }
}
