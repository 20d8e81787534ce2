//! HTTP client for the Marvel catalog API.
//!
//! Every request carries the gateway's signed query string: `ts`,
//! `apikey` (public key) and `hash` = md5(ts + private key + public
//! key). Filter structs are serialized to query parameters the same way
//! for every endpoint: absent values skipped, booleans as strings.

use crate::config::MarvelConfig;
use crate::error::{MarvelError, MarvelResult};
use crate::marvel::cache::ResponseCache;
use crate::marvel::types::{CharacterDataWrapper, CharacterFilters, ComicDataWrapper, ComicFilters};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument};

/// Client for the Marvel catalog API.
pub struct MarvelClient {
    http: reqwest::Client,
    config: MarvelConfig,
    cache: ResponseCache,
}

impl MarvelClient {
    pub fn new(config: MarvelConfig) -> MarvelResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            cache: ResponseCache::new(config.cache_ttl),
            config,
        })
    }

    /// Fetch characters with optional filters.
    pub async fn characters(&self, filters: &CharacterFilters) -> MarvelResult<CharacterDataWrapper> {
        self.get_json("characters", &query_pairs(filters)?).await
    }

    /// Fetch a single character by id.
    pub async fn character_by_id(&self, character_id: i64) -> MarvelResult<CharacterDataWrapper> {
        self.get_json(&format!("characters/{}", character_id), &[])
            .await
    }

    /// Fetch comics featuring a character.
    pub async fn comics_for_character(
        &self,
        character_id: i64,
        filters: &ComicFilters,
    ) -> MarvelResult<ComicDataWrapper> {
        self.get_json(
            &format!("characters/{}/comics", character_id),
            &query_pairs(filters)?,
        )
        .await
    }

    /// Fetch comics with optional filters.
    pub async fn comics(&self, filters: &ComicFilters) -> MarvelResult<ComicDataWrapper> {
        self.get_json("comics", &query_pairs(filters)?).await
    }

    /// Fetch a single comic by id.
    pub async fn comic_by_id(&self, comic_id: i64) -> MarvelResult<ComicDataWrapper> {
        self.get_json(&format!("comics/{}", comic_id), &[]).await
    }

    /// Fetch characters appearing in a comic.
    pub async fn characters_for_comic(
        &self,
        comic_id: i64,
        filters: &CharacterFilters,
    ) -> MarvelResult<CharacterDataWrapper> {
        self.get_json(
            &format!("comics/{}/characters", comic_id),
            &query_pairs(filters)?,
        )
        .await
    }

    #[instrument(skip(self, params), fields(path = %path))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> MarvelResult<T> {
        let cache_key = cache_key(path, params);
        if let Some(value) = self.cache.get(&cache_key) {
            return serde_json::from_value(value).map_err(|e| MarvelError::Decode(e.to_string()));
        }

        let base = self.config.api_base.trim_end_matches('/');
        let mut url = reqwest::Url::parse(&format!("{}/{}", base, path))
            .map_err(|e| MarvelError::InvalidBaseUrl(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            let (ts, hash) = self.auth_params();
            query.append_pair("ts", &ts);
            query.append_pair("apikey", &self.config.public_key);
            query.append_pair("hash", &hash);
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }

        debug!("GET {}", path);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(MarvelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value =
            serde_json::from_str(&body).map_err(|e| MarvelError::Decode(e.to_string()))?;
        self.cache.put(cache_key, value.clone());
        serde_json::from_value(value).map_err(|e| MarvelError::Decode(e.to_string()))
    }

    fn auth_params(&self) -> (String, String) {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis().to_string())
            .unwrap_or_else(|_| "0".into());
        let hash = signature(&ts, &self.config.private_key, &self.config.public_key);
        (ts, hash)
    }
}

/// Gateway request signature: md5 over ts + private key + public key.
fn signature(ts: &str, private_key: &str, public_key: &str) -> String {
    format!(
        "{:x}",
        md5::compute(format!("{}{}{}", ts, private_key, public_key))
    )
}

/// Serialize a filter struct into query pairs: absent values skipped,
/// booleans stringified, everything else rendered as its JSON scalar.
pub(crate) fn query_pairs<T: Serialize>(filters: &T) -> MarvelResult<Vec<(String, String)>> {
    let value =
        serde_json::to_value(filters).map_err(|e| MarvelError::Request(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(MarvelError::Request(
            "Query filters must serialize to an object".into(),
        ));
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Null => continue,
            Value::Bool(b) => pairs.push((key, b.to_string())),
            Value::Number(n) => pairs.push((key, n.to_string())),
            Value::String(s) => pairs.push((key, s)),
            other => pairs.push((key, other.to_string())),
        }
    }
    Ok(pairs)
}

fn cache_key(path: &str, params: &[(String, String)]) -> String {
    let mut key = String::from(path);
    for (name, value) in params {
        key.push('&');
        key.push_str(name);
        key.push('=');
        key.push_str(value);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarvelConfigBuilder;

    #[test]
    fn test_signature_matches_documented_example() {
        // The gateway's documented example: ts=1, private=abcd, public=1234.
        assert_eq!(
            signature("1", "abcd", "1234"),
            "ffd275c5130566a2916217b101f26150"
        );
    }

    #[test]
    fn test_query_pairs_skips_absent_and_stringifies_bools() {
        let filters = ComicFilters {
            no_variants: Some(true),
            start_year: Some(1963),
            title: Some("X-Men".into()),
            ..Default::default()
        };
        let pairs = query_pairs(&filters).unwrap();
        assert_eq!(pairs.len(), 3);
        assert!(pairs.contains(&("noVariants".into(), "true".into())));
        assert!(pairs.contains(&("startYear".into(), "1963".into())));
        assert!(pairs.contains(&("title".into(), "X-Men".into())));
    }

    #[test]
    fn test_cache_key_includes_filters() {
        let a = cache_key("comics", &[("title".into(), "X-Men".into())]);
        let b = cache_key("comics", &[("title".into(), "Avengers".into())]);
        assert_ne!(a, b);
        assert!(a.starts_with("comics"));
    }

    #[test]
    fn test_client_builds_from_config() {
        let config = MarvelConfigBuilder::new()
            .public_key("1234")
            .private_key("abcd")
            .build()
            .unwrap();
        assert!(MarvelClient::new(config).is_ok());
    }
}
