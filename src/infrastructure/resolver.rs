//! Reference resolution with a run-scoped cache
//!
//! Resolves reference URLs (homeworld, films, ...) to display names so no
//! raw URL ever reaches the store. Resolution is best-effort: any failure
//! degrades to an unresolved tag, never an error. Results, including
//! failures, are memoized by URL for the lifetime of the resolver, so one
//! run issues at most one network call per URL. Two tasks racing on the
//! same uncached URL may both fetch; both write the same value.

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::infrastructure::catalog_client::{CatalogClient, ReferenceProperties};

/// Which payload field carries the display name for a reference category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Planet,
    Film,
    Species,
    Starship,
    Vehicle,
}

impl ReferenceKind {
    fn display_name(self, properties: &ReferenceProperties) -> Option<String> {
        let raw = match self {
            Self::Film => properties.title.as_deref(),
            _ => properties.name.as_deref(),
        };
        raw.map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }
}

/// URL-to-name resolver shared by all fetch tasks of one run
pub struct ReferenceResolver<C> {
    client: Arc<C>,
    cache: RwLock<HashMap<String, Option<String>>>,
}

impl<C: CatalogClient> ReferenceResolver<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve one reference URL to a display name. `None` means
    /// unresolved; the persistence boundary turns that into the sentinel.
    pub async fn resolve(&self, url: Option<&str>, kind: ReferenceKind) -> Option<String> {
        let url = url.map(str::trim).filter(|url| !url.is_empty())?;

        if let Some(cached) = self.cache.read().await.get(url) {
            return cached.clone();
        }

        let resolved = match self.client.fetch_reference(url).await {
            Ok(properties) => kind.display_name(&properties),
            Err(err) => {
                debug!("reference {url} did not resolve: {err}");
                None
            }
        };

        self.cache
            .write()
            .await
            .insert(url.to_string(), resolved.clone());
        resolved
    }

    /// Resolve a list of reference URLs concurrently and join the resolved
    /// names with `", "`. An all-unresolved list yields an empty string.
    pub async fn resolve_list(&self, urls: &[String], kind: ReferenceKind) -> String {
        let names = join_all(
            urls.iter()
                .map(|url| self.resolve(Some(url.as_str()), kind)),
        )
        .await;

        names
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::character::CharacterProperties;
    use crate::infrastructure::api_error::{ApiError, ApiResult};
    use crate::infrastructure::catalog_client::CharacterPage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Catalog double that serves canned references and counts calls
    #[derive(Default)]
    struct FakeCatalog {
        references: HashMap<String, ReferenceProperties>,
        failing: Vec<String>,
        reference_calls: AtomicUsize,
    }

    impl FakeCatalog {
        fn with_reference(mut self, url: &str, name: Option<&str>, title: Option<&str>) -> Self {
            self.references.insert(
                url.to_string(),
                ReferenceProperties {
                    name: name.map(str::to_string),
                    title: title.map(str::to_string),
                },
            );
            self
        }

        fn with_failing(mut self, url: &str) -> Self {
            self.failing.push(url.to_string());
            self
        }

        fn calls(&self) -> usize {
            self.reference_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogClient for FakeCatalog {
        async fn fetch_page(&self, _page: u32) -> ApiResult<CharacterPage> {
            unimplemented!("not used by resolver tests")
        }

        async fn fetch_character(&self, _id: i64) -> ApiResult<CharacterProperties> {
            unimplemented!("not used by resolver tests")
        }

        async fn character_exists(&self, _id: i64) -> ApiResult<bool> {
            unimplemented!("not used by resolver tests")
        }

        async fn fetch_reference(&self, url: &str) -> ApiResult<ReferenceProperties> {
            self.reference_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.iter().any(|failing| failing == url) {
                return Err(ApiError::Status {
                    status: 500,
                    url: url.to_string(),
                });
            }
            self.references
                .get(url)
                .cloned()
                .ok_or_else(|| ApiError::NotFound {
                    url: url.to_string(),
                })
        }
    }

    fn resolver(catalog: FakeCatalog) -> ReferenceResolver<FakeCatalog> {
        ReferenceResolver::new(Arc::new(catalog))
    }

    #[tokio::test]
    async fn second_resolution_is_served_from_cache() {
        let resolver = resolver(
            FakeCatalog::default().with_reference("p/1", Some("Tatooine"), None),
        );

        let first = resolver.resolve(Some("p/1"), ReferenceKind::Planet).await;
        let second = resolver.resolve(Some("p/1"), ReferenceKind::Planet).await;

        assert_eq!(first.as_deref(), Some("Tatooine"));
        assert_eq!(second.as_deref(), Some("Tatooine"));
        assert_eq!(resolver.client.calls(), 1);
    }

    #[tokio::test]
    async fn empty_url_resolves_without_network_call() {
        let resolver = resolver(FakeCatalog::default());

        assert_eq!(resolver.resolve(None, ReferenceKind::Planet).await, None);
        assert_eq!(resolver.resolve(Some(""), ReferenceKind::Planet).await, None);
        assert_eq!(
            resolver.resolve(Some("   "), ReferenceKind::Planet).await,
            None
        );
        assert_eq!(resolver.client.calls(), 0);
    }

    #[tokio::test]
    async fn failures_degrade_to_unresolved_and_are_cached() {
        let resolver = resolver(FakeCatalog::default().with_failing("p/9"));

        assert_eq!(resolver.resolve(Some("p/9"), ReferenceKind::Planet).await, None);
        assert_eq!(resolver.resolve(Some("p/9"), ReferenceKind::Planet).await, None);
        assert_eq!(resolver.client.calls(), 1);
    }

    #[tokio::test]
    async fn film_kind_reads_title_field() {
        let resolver = resolver(
            FakeCatalog::default().with_reference("f/1", None, Some("A New Hope")),
        );

        let name = resolver.resolve(Some("f/1"), ReferenceKind::Film).await;
        assert_eq!(name.as_deref(), Some("A New Hope"));
    }

    #[tokio::test]
    async fn resolve_list_joins_resolved_names_only() {
        let resolver = resolver(
            FakeCatalog::default()
                .with_reference("f/1", None, Some("A New Hope"))
                .with_reference("f/2", None, Some("The Empire Strikes Back"))
                .with_failing("f/3"),
        );
        let urls = vec![
            "f/1".to_string(),
            "f/3".to_string(),
            "f/2".to_string(),
        ];

        let joined = resolver.resolve_list(&urls, ReferenceKind::Film).await;
        assert_eq!(joined, "A New Hope, The Empire Strikes Back");
    }

    #[tokio::test]
    async fn all_unresolved_list_yields_empty_string() {
        let resolver = resolver(FakeCatalog::default().with_failing("f/3"));
        let urls = vec!["f/3".to_string()];

        assert_eq!(resolver.resolve_list(&urls, ReferenceKind::Film).await, "");
    }
}
