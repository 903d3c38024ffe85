//! Typed client for the paginated remote catalog
//!
//! All payloads are parsed into typed DTOs right at the HTTP boundary;
//! nothing downstream inspects untyped JSON. The [`CatalogClient`] trait is
//! the seam test doubles implement.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::domain::character::CharacterProperties;
use crate::infrastructure::api_error::{ApiError, ApiResult};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http_client::HttpClient;

/// One pagination page of the character listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CharacterPage {
    #[serde(default)]
    pub results: Vec<PageEntry>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub total_records: Option<u64>,
}

/// A single listing entry; the catalog reports IDs as string `uid`s
#[derive(Debug, Clone, Deserialize)]
pub struct PageEntry {
    pub uid: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Display-name fields of a referenced resource. Films carry `title`,
/// every other category carries `name`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferenceProperties {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    result: Option<DetailResult>,
}

#[derive(Debug, Deserialize)]
struct DetailResult {
    properties: Option<CharacterProperties>,
}

#[derive(Debug, Deserialize)]
struct ReferenceEnvelope {
    result: Option<ReferenceResult>,
}

#[derive(Debug, Deserialize)]
struct ReferenceResult {
    properties: Option<ReferenceProperties>,
}

/// Remote catalog operations used by the synchronization engine
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch one listing page (1-based page number).
    async fn fetch_page(&self, page: u32) -> ApiResult<CharacterPage>;

    /// Fetch the full payload for one character.
    async fn fetch_character(&self, id: i64) -> ApiResult<CharacterProperties>;

    /// Existence check for one character ID; used by the range probe.
    async fn character_exists(&self, id: i64) -> ApiResult<bool>;

    /// Fetch a referenced resource by its URL.
    async fn fetch_reference(&self, url: &str) -> ApiResult<ReferenceProperties>;
}

/// HTTP-backed catalog client
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    http: HttpClient,
    base_url: String,
    page_size: u32,
    page_timeout: Duration,
    detail_timeout: Duration,
    reference_timeout: Duration,
}

impl HttpCatalogClient {
    pub fn new(http: HttpClient, config: &AppConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.sync.page_size,
            page_timeout: Duration::from_secs(config.sync.page_timeout_secs),
            detail_timeout: Duration::from_secs(config.sync.detail_timeout_secs),
            reference_timeout: Duration::from_secs(config.sync.reference_timeout_secs),
        }
    }

    fn people_url(&self, id: i64) -> String {
        format!("{}/people/{id}", self.base_url)
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn fetch_page(&self, page: u32) -> ApiResult<CharacterPage> {
        let url = format!(
            "{}/people?page={page}&limit={}",
            self.base_url, self.page_size
        );
        self.http.get_json(&url, self.page_timeout).await
    }

    async fn fetch_character(&self, id: i64) -> ApiResult<CharacterProperties> {
        let url = self.people_url(id);
        let envelope: DetailEnvelope = self.http.get_json(&url, self.detail_timeout).await?;

        envelope
            .result
            .and_then(|result| result.properties)
            .ok_or_else(|| ApiError::malformed(&url, "missing result.properties"))
    }

    async fn character_exists(&self, id: i64) -> ApiResult<bool> {
        self.http
            .exists(&self.people_url(id), self.page_timeout)
            .await
    }

    async fn fetch_reference(&self, url: &str) -> ApiResult<ReferenceProperties> {
        let envelope: ReferenceEnvelope = self.http.get_json(url, self.reference_timeout).await?;

        envelope
            .result
            .and_then(|result| result.properties)
            .ok_or_else(|| ApiError::malformed(url, "missing result.properties"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_payload_parses() {
        let body = r#"{
            "total_records": 82,
            "results": [{"uid": "1", "name": "Luke Skywalker"}, {"uid": "2"}],
            "next": "https://catalog.test/api/people?page=2&limit=10"
        }"#;
        let page: CharacterPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].uid, "1");
        assert_eq!(page.total_records, Some(82));
        assert!(page.next.is_some());
    }

    #[test]
    fn last_page_has_null_next() {
        let body = r#"{"results": [{"uid": "81"}], "next": null}"#;
        let page: CharacterPage = serde_json::from_str(body).unwrap();
        assert!(page.next.is_none());
    }

    #[test]
    fn detail_envelope_flattens_to_properties() {
        let body = r#"{
            "result": {"properties": {
                "name": "Leia Organa",
                "birth_year": "19BBY",
                "homeworld": "https://catalog.test/api/planets/2",
                "films": ["https://catalog.test/api/films/1"]
            }}
        }"#;
        let envelope: DetailEnvelope = serde_json::from_str(body).unwrap();
        let properties = envelope.result.unwrap().properties.unwrap();
        assert_eq!(properties.name.as_deref(), Some("Leia Organa"));
        assert_eq!(properties.films.len(), 1);
        assert!(properties.species.is_empty());
    }

    #[test]
    fn detail_envelope_without_properties_is_detectable() {
        let body = r#"{"result": {}}"#;
        let envelope: DetailEnvelope = serde_json::from_str(body).unwrap();
        assert!(envelope.result.unwrap().properties.is_none());
    }
}
