//! Marvel API response model and query filters.
//!
//! Mirrors the wrapper/container/resource nesting of the catalog API:
//! every endpoint returns a `DataWrapper` holding a paginated
//! `DataContainer` of resources.

use serde::{Deserialize, Serialize};

/// A typed URL attached to a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceUrl {
    #[serde(rename = "type")]
    pub url_type: String,
    pub url: String,
}

/// Image reference; the full URL is `{path}.{extension}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub path: String,
    pub extension: String,
}

/// Summary reference to a comic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicSummary {
    #[serde(rename = "resourceURI")]
    pub resource_uri: String,
    pub name: String,
}

/// Summary reference to a story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorySummary {
    #[serde(rename = "resourceURI")]
    pub resource_uri: String,
    pub name: String,
    #[serde(rename = "type")]
    pub story_type: String,
}

/// Summary reference to an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    #[serde(rename = "resourceURI")]
    pub resource_uri: String,
    pub name: String,
}

/// Summary reference to a series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesSummary {
    #[serde(rename = "resourceURI")]
    pub resource_uri: String,
    pub name: String,
}

/// Summary reference to a creator with their role on the resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorSummary {
    #[serde(rename = "resourceURI")]
    pub resource_uri: String,
    pub name: String,
    pub role: String,
}

/// Summary reference to a character appearing in a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterSummary {
    #[serde(rename = "resourceURI")]
    pub resource_uri: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Embedded list of summary items with availability counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceList<T> {
    pub available: i64,
    pub returned: i64,
    #[serde(rename = "collectionURI")]
    pub collection_uri: String,
    pub items: Vec<T>,
}

/// A descriptive text attached to a comic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub text_type: String,
    pub language: String,
    pub text: String,
}

/// A dated milestone of a comic (on-sale date, FOC date, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComicDate {
    #[serde(rename = "type")]
    pub date_type: String,
    pub date: String,
}

/// A price point of a comic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComicPrice {
    #[serde(rename = "type")]
    pub price_type: String,
    pub price: f64,
}

/// A Marvel character resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub modified: String,
    #[serde(rename = "resourceURI")]
    pub resource_uri: String,
    pub urls: Vec<ResourceUrl>,
    pub thumbnail: Image,
    pub comics: ResourceList<ComicSummary>,
    pub stories: ResourceList<StorySummary>,
    pub events: ResourceList<EventSummary>,
    pub series: ResourceList<SeriesSummary>,
}

/// A Marvel comic resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comic {
    pub id: i64,
    pub digital_id: i64,
    pub title: String,
    // Fractional issue numbers exist (annuals, point-one issues).
    pub issue_number: f64,
    pub variant_description: String,
    pub description: Option<String>,
    pub modified: String,
    pub isbn: String,
    pub upc: String,
    pub diamond_code: String,
    pub ean: String,
    pub issn: String,
    pub format: String,
    pub page_count: i64,
    pub text_objects: Vec<TextObject>,
    #[serde(rename = "resourceURI")]
    pub resource_uri: String,
    pub urls: Vec<ResourceUrl>,
    pub series: SeriesSummary,
    pub variants: Vec<ComicSummary>,
    pub collections: Vec<ComicSummary>,
    pub collected_issues: Vec<ComicSummary>,
    pub dates: Vec<ComicDate>,
    pub prices: Vec<ComicPrice>,
    pub thumbnail: Image,
    pub images: Vec<Image>,
    pub creators: ResourceList<CreatorSummary>,
    pub characters: ResourceList<CharacterSummary>,
    pub stories: ResourceList<StorySummary>,
    pub events: ResourceList<EventSummary>,
}

/// Paginated result page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataContainer<T> {
    pub offset: i64,
    pub limit: i64,
    pub total: i64,
    pub count: i64,
    pub results: Vec<T>,
}

/// Top-level envelope of every catalog API response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataWrapper<T> {
    pub code: i64,
    pub status: String,
    pub copyright: String,
    pub attribution_text: String,
    #[serde(rename = "attributionHTML")]
    pub attribution_html: String,
    pub data: DataContainer<T>,
    pub etag: String,
}

pub type CharacterDataWrapper = DataWrapper<Character>;
pub type ComicDataWrapper = DataWrapper<Comic>;

/// Filters for character listing endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_starts_with: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stories: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

/// Filters for comic listing endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_variants: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_descriptor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_starts_with: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diamond_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digital_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ean: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_digital_issue: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creators: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stories: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_appearances: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaborators: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_wrapper_deserializes() {
        let json = serde_json::json!({
            "code": 200,
            "status": "Ok",
            "copyright": "© 2024 MARVEL",
            "attributionText": "Data provided by Marvel. © 2024 MARVEL",
            "attributionHTML": "<a href=\"http://marvel.com\">Marvel</a>",
            "etag": "abc123",
            "data": {
                "offset": 0,
                "limit": 20,
                "total": 1,
                "count": 1,
                "results": [{
                    "id": 1009610,
                    "name": "Spider-Man",
                    "description": "Bitten by a radioactive spider.",
                    "modified": "2020-07-21T10:30:10-0400",
                    "resourceURI": "http://gateway.marvel.com/v1/public/characters/1009610",
                    "urls": [{"type": "detail", "url": "http://marvel.com/characters/54"}],
                    "thumbnail": {"path": "http://i.annihil.us/u/prod/marvel/x", "extension": "jpg"},
                    "comics": {"available": 2, "returned": 1, "collectionURI": "http://x",
                               "items": [{"resourceURI": "http://y", "name": "ASM #1"}]},
                    "stories": {"available": 0, "returned": 0, "collectionURI": "http://x", "items": []},
                    "events": {"available": 0, "returned": 0, "collectionURI": "http://x", "items": []},
                    "series": {"available": 0, "returned": 0, "collectionURI": "http://x", "items": []}
                }]
            }
        });

        let wrapper: CharacterDataWrapper = serde_json::from_value(json).unwrap();
        assert_eq!(wrapper.code, 200);
        assert_eq!(wrapper.data.results[0].name, "Spider-Man");
        assert_eq!(wrapper.data.results[0].comics.items[0].name, "ASM #1");
    }

    #[test]
    fn test_comic_nullable_description() {
        let summary = serde_json::json!({"available":0,"returned":0,"collectionURI":"u","items":[]});
        let json = serde_json::json!({
            "id": 428, "digitalId": 0, "title": "X-Men #1", "issueNumber": 1.0,
            "variantDescription": "", "description": null,
            "modified": "2019-01-01T00:00:00-0500",
            "isbn": "", "upc": "", "diamondCode": "", "ean": "", "issn": "",
            "format": "Comic", "pageCount": 32, "textObjects": [],
            "resourceURI": "http://gateway.marvel.com/v1/public/comics/428",
            "urls": [], "series": {"resourceURI": "u", "name": "X-Men"},
            "variants": [], "collections": [], "collectedIssues": [],
            "dates": [{"type": "onsaleDate", "date": "1963-09-01T00:00:00-0400"}],
            "prices": [{"type": "printPrice", "price": 0.12}],
            "thumbnail": {"path": "p", "extension": "jpg"}, "images": [],
            "creators": summary.clone(), "characters": summary.clone(),
            "stories": summary.clone(), "events": summary
        });

        let comic: Comic = serde_json::from_value(json).unwrap();
        assert!(comic.description.is_none());
        assert_eq!(comic.prices[0].price, 0.12);
    }

    #[test]
    fn test_filters_serialize_camel_case_and_skip_absent() {
        let filters = ComicFilters {
            title_starts_with: Some("Secret".into()),
            no_variants: Some(true),
            limit: Some(10),
            ..Default::default()
        };
        let value = serde_json::to_value(&filters).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["titleStartsWith"], "Secret");
        assert_eq!(obj["noVariants"], true);
    }
}
