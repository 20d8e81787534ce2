//! Comic lookup tools.

use crate::error::Result;
use crate::marvel::{ComicFilters, MarvelClient};
use crate::protocol::{CallToolResult, Tool};
use crate::tools::registry::ToolHandler;
use crate::tools::{check_limit, parse_args};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// JSON schema fragment shared by the comic-filtering tools.
fn comic_filter_properties() -> serde_json::Map<String, Value> {
    let properties = serde_json::json!({
        "format": {
            "type": "string",
            "description": "Filter by format, e.g. comic, hardcover, trade paperback."
        },
        "formatType": {
            "type": "string",
            "description": "Filter by format type: comic or collection."
        },
        "noVariants": {
            "type": "boolean",
            "description": "Exclude variants (alternate covers, second printings)."
        },
        "dateDescriptor": {
            "type": "string",
            "description": "Return comics within a predefined date range: lastWeek, thisWeek, nextWeek, thisMonth."
        },
        "dateRange": {
            "type": "string",
            "description": "Return comics within a date range, e.g. 2023-01-01,2023-12-31."
        },
        "title": {
            "type": "string",
            "description": "Return only comics matching this full title."
        },
        "titleStartsWith": {
            "type": "string",
            "description": "Return comics whose title begins with this string."
        },
        "startYear": {
            "type": "integer",
            "description": "Return only comics from the series with this start year."
        },
        "issueNumber": {
            "type": "integer",
            "description": "Return only comics with this issue number."
        },
        "diamondCode": {
            "type": "string",
            "description": "Filter by Diamond code."
        },
        "digitalId": {
            "type": "integer",
            "description": "Filter by digital comic id."
        },
        "upc": {
            "type": "string",
            "description": "Filter by UPC."
        },
        "isbn": {
            "type": "string",
            "description": "Filter by ISBN."
        },
        "ean": {
            "type": "string",
            "description": "Filter by EAN."
        },
        "issn": {
            "type": "string",
            "description": "Filter by ISSN."
        },
        "hasDigitalIssue": {
            "type": "boolean",
            "description": "Return only comics available digitally."
        },
        "modifiedSince": {
            "type": "string",
            "description": "Return only comics modified since this date (ISO 8601)."
        },
        "creators": {
            "type": "string",
            "description": "Comma-separated creator ids the comics must involve."
        },
        "series": {
            "type": "string",
            "description": "Comma-separated series ids the comics must belong to."
        },
        "events": {
            "type": "string",
            "description": "Comma-separated event ids the comics must tie into."
        },
        "stories": {
            "type": "string",
            "description": "Comma-separated story ids the comics must contain."
        },
        "sharedAppearances": {
            "type": "string",
            "description": "Comma-separated character ids that must all appear together."
        },
        "collaborators": {
            "type": "string",
            "description": "Comma-separated creator ids that must have worked together."
        },
        "orderBy": {
            "type": "string",
            "description": "Sort order, e.g. title, issueNumber, onsaleDate, -modified."
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
    });
    match properties {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetComicsForCharacterArgs {
    character_id: i64,
    #[serde(flatten)]
    filters: ComicFilters,
}

/// `get_comics_for_character` - comics featuring a character.
pub struct GetComicsForCharacterTool {
    client: Arc<MarvelClient>,
}

impl GetComicsForCharacterTool {
    pub fn new(client: Arc<MarvelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetComicsForCharacterTool {
    fn definition(&self) -> Tool {
        let mut properties = serde_json::Map::new();
        properties.insert(
            "characterId".into(),
            serde_json::json!({
                "type": "integer",
                "description": "The unique ID of the character."
            }),
        );
        properties.extend(comic_filter_properties());

        Tool {
            name: "get_comics_for_character".into(),
            description: Some(
                "Fetch Marvel comics filtered by character ID and optional filters.".into(),
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": properties,
                "required": ["characterId"]
            }),
        }
    }

    #[instrument(skip(self, arguments), fields(tool = "get_comics_for_character"))]
    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: GetComicsForCharacterArgs = parse_args(arguments)?;
        check_limit(args.filters.limit)?;

        let wrapper = self
            .client
            .comics_for_character(args.character_id, &args.filters)
            .await?;
        Ok(CallToolResult::json(&wrapper))
    }
}

/// `get_comics` - list comics with optional filters.
pub struct GetComicsTool {
    client: Arc<MarvelClient>,
}

impl GetComicsTool {
    pub fn new(client: Arc<MarvelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetComicsTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_comics".into(),
            description: Some("Fetches lists of Marvel comics with optional filters.".into()),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": comic_filter_properties()
            }),
        }
    }

    #[instrument(skip(self, arguments), fields(tool = "get_comics"))]
    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let filters: ComicFilters = parse_args(arguments)?;
        check_limit(filters.limit)?;

        let wrapper = self.client.comics(&filters).await?;
        Ok(CallToolResult::json(&wrapper))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetComicByIdArgs {
    comic_id: i64,
}

/// `get_comic_by_id` - fetch one comic.
pub struct GetComicByIdTool {
    client: Arc<MarvelClient>,
}

impl GetComicByIdTool {
    pub fn new(client: Arc<MarvelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetComicByIdTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_comic_by_id".into(),
            description: Some("Fetch a single Marvel comic by ID.".into()),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "comicId": {
                        "type": "integer",
                        "description": "The unique ID of the comic."
                    }
                },
                "required": ["comicId"]
            }),
        }
    }

    #[instrument(skip(self, arguments), fields(tool = "get_comic_by_id"))]
    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: GetComicByIdArgs = parse_args(arguments)?;

        let wrapper = self.client.comic_by_id(args.comic_id).await?;
        Ok(CallToolResult::json(&wrapper))
    }
}
