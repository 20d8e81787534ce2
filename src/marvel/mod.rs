//! Marvel catalog API client, response model and response cache.

pub mod cache;
pub mod client;
pub mod types;

pub use cache::ResponseCache;
pub use client::MarvelClient;
pub use types::{
    Character, CharacterDataWrapper, CharacterFilters, Comic, ComicDataWrapper, ComicFilters,
};
