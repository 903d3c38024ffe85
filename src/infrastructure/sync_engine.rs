//! Batch synchronization engine
//!
//! Staged pipeline: discover the remote ID space, diff it against the
//! local store, fetch the missing records in batches under a shared
//! concurrency cap, and persist each batch before the next one starts.
//! Every stage degrades to a best-effort partial result; only a store
//! that cannot be read at all aborts the run.

use anyhow::{Context, Result};
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::application::reporter::ProgressReporter;
use crate::domain::character::{CharacterRecord, ResolvedReferences};
use crate::domain::events::{SyncProgress, SyncStage, SyncSummary};
use crate::domain::repositories::CharacterRepository;
use crate::infrastructure::api_error::ApiError;
use crate::infrastructure::catalog_client::CatalogClient;
use crate::infrastructure::config::SyncConfig;
use crate::infrastructure::resolver::{ReferenceKind, ReferenceResolver};
use crate::infrastructure::retry::RetryPolicy;

/// Result of the ID discovery stage
#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    /// Deduplicated, ascending-sorted union of all discovered IDs
    pub ids: Vec<i64>,
    /// Best-effort total reported by the first page, for progress display
    pub total_hint: Option<u64>,
}

/// IDs discovered remotely but absent from the store, in ascending
/// discovered order. Pure function; the only diff logic in the engine.
pub fn compute_missing_ids(discovered: &[i64], existing: &HashSet<i64>) -> Vec<i64> {
    discovered
        .iter()
        .copied()
        .filter(|id| !existing.contains(id))
        .collect()
}

/// Extract the `page` query parameter from a pagination "next" link.
fn next_page_number(next: &str) -> Option<u32> {
    let parsed = Url::parse(next).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}

/// Staged batch synchronization engine
pub struct SyncEngine<C, R> {
    client: Arc<C>,
    repository: Arc<R>,
    resolver: Arc<ReferenceResolver<C>>,
    reporter: Arc<dyn ProgressReporter>,
    retry: RetryPolicy,
    config: SyncConfig,
    session_id: String,
}

impl<C, R> SyncEngine<C, R>
where
    C: CatalogClient + 'static,
    R: CharacterRepository,
{
    pub fn new(
        client: Arc<C>,
        repository: Arc<R>,
        resolver: Arc<ReferenceResolver<C>>,
        reporter: Arc<dyn ProgressReporter>,
        config: SyncConfig,
    ) -> Self {
        let retry = RetryPolicy::from_sync_config(&config);
        Self {
            client,
            repository,
            resolver,
            reporter,
            retry,
            config,
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Run the full synchronization pipeline.
    pub async fn execute(&self) -> Result<SyncSummary> {
        let run_started = Instant::now();
        let started_at = Utc::now();
        info!("starting synchronization session {}", self.session_id);

        // One cap for the whole run: range probes and detail fetches share it
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_requests.max(1)));

        self.reporter
            .stage_started(SyncStage::Discovery, "discovering remote character ids")
            .await;
        let discovery = self.discover_ids(&semaphore).await;
        self.reporter
            .progress(SyncProgress::new(
                &self.session_id,
                SyncStage::Discovery,
                discovery.ids.len() as u64,
                discovery.total_hint.unwrap_or(discovery.ids.len() as u64),
                "remote ids discovered",
            ))
            .await;

        if discovery.ids.is_empty() {
            warn!("discovery yielded no ids; nothing to synchronize");
            let summary = self.summary(started_at, run_started, 0, 0, 0, 0);
            self.reporter.completed(&summary).await;
            return Ok(summary);
        }

        self.reporter
            .stage_started(SyncStage::Diff, "diffing discovered ids against the store")
            .await;
        let existing = self
            .repository
            .existing_ids()
            .await
            .context("failed to read existing ids from the store")?;
        let pending = compute_missing_ids(&discovery.ids, &existing);

        let found = discovery.ids.len() as u64;
        let already_present = found - pending.len() as u64;
        info!(
            "discovered {found} remote ids, {already_present} already present, {} to fetch",
            pending.len()
        );

        if pending.is_empty() {
            let summary = self.summary(started_at, run_started, found, already_present, 0, 0);
            self.reporter.completed(&summary).await;
            return Ok(summary);
        }

        self.reporter
            .stage_started(
                SyncStage::DetailFetch,
                &format!("fetching {} missing characters", pending.len()),
            )
            .await;
        let (loaded, errors) = self.fetch_and_persist(&pending, &semaphore).await;

        let summary = self.summary(started_at, run_started, found, already_present, loaded, errors);
        self.reporter.completed(&summary).await;
        Ok(summary)
    }

    /// Stage 1: enumerate remote IDs.
    ///
    /// Pagination walk first; when it yields fewer than the configured
    /// threshold of distinct IDs, a brute-force probe over the configured
    /// ID range is unioned in. Partial results are acceptable, never fatal.
    async fn discover_ids(&self, semaphore: &Arc<Semaphore>) -> DiscoveryOutcome {
        let mut ordered: Vec<i64> = Vec::new();
        let mut seen: HashSet<i64> = HashSet::new();
        let mut total_hint = None;

        let mut page = 1u32;
        let mut pages_walked = 0u32;
        loop {
            if pages_walked >= self.config.max_pages {
                warn!(
                    "page ceiling of {} reached, stopping pagination walk",
                    self.config.max_pages
                );
                break;
            }

            let label = format!("page {page}");
            let listing = match self.retry.execute(&label, || self.client.fetch_page(page)).await {
                Ok(listing) => listing,
                Err(err) => {
                    warn!("pagination walk stopped at page {page}: {err}");
                    break;
                }
            };
            pages_walked += 1;

            if pages_walked == 1 {
                total_hint = listing.total_records;
            }

            if listing.results.is_empty() {
                debug!("page {page} returned no results, walk complete");
                break;
            }

            for entry in &listing.results {
                match entry.uid.parse::<i64>() {
                    Ok(id) if id > 0 => {
                        if seen.insert(id) {
                            ordered.push(id);
                        }
                    }
                    _ => warn!("ignoring unusable uid {:?} on page {page}", entry.uid),
                }
            }
            debug!(
                "page {page}: {} entries, {} distinct ids so far",
                listing.results.len(),
                seen.len()
            );

            let Some(next) = listing.next.as_deref() else {
                break;
            };
            match next_page_number(next) {
                Some(next_page) if next_page == page => {
                    warn!("next link repeats page {page}, stopping pagination walk");
                    break;
                }
                Some(next_page) => page = next_page,
                None => {
                    warn!("next link {next:?} has no usable page number, stopping pagination walk");
                    break;
                }
            }
        }

        if seen.len() < self.config.probe_threshold {
            info!(
                "pagination yielded {} ids (below threshold {}), probing id range {}..={}",
                seen.len(),
                self.config.probe_threshold,
                self.config.probe_range_start,
                self.config.probe_range_end
            );
            for id in self.probe_id_range(semaphore).await {
                if seen.insert(id) {
                    ordered.push(id);
                }
            }
        }

        ordered.sort_unstable();
        DiscoveryOutcome {
            ids: ordered,
            total_hint,
        }
    }

    /// Discovery fallback: one existence check per ID in the configured
    /// range, under the shared request cap.
    async fn probe_id_range(&self, semaphore: &Arc<Semaphore>) -> Vec<i64> {
        let tasks: Vec<_> = (self.config.probe_range_start..=self.config.probe_range_end)
            .map(|id| {
                let semaphore = Arc::clone(semaphore);
                let client = Arc::clone(&self.client);
                let retry = self.retry.clone();
                tokio::spawn(async move {
                    let _permit = semaphore.acquire().await.ok()?;
                    let label = format!("probe {id}");
                    match retry.execute(&label, || client.character_exists(id)).await {
                        Ok(true) => Some(id),
                        Ok(false) => None,
                        Err(err) => {
                            debug!("probe {id} failed: {err}");
                            None
                        }
                    }
                })
            })
            .collect();

        join_all(tasks)
            .await
            .into_iter()
            .filter_map(|task| task.ok().flatten())
            .collect()
    }

    /// Stages 3+4: batched fetch with per-batch persistence, progress
    /// after every batch, and a pause between batches to bound burst load.
    async fn fetch_and_persist(&self, pending: &[i64], semaphore: &Arc<Semaphore>) -> (u64, u64) {
        let total = pending.len() as u64;
        let mut loaded = 0u64;
        let mut errors = 0u64;
        let batch_delay = Duration::from_millis(self.config.batch_delay_ms);

        for (batch_index, batch) in pending.chunks(self.config.batch_size.max(1)).enumerate() {
            if batch_index > 0 && !batch_delay.is_zero() {
                sleep(batch_delay).await;
            }

            let tasks: Vec<_> = batch
                .iter()
                .copied()
                .map(|id| {
                    let semaphore = Arc::clone(semaphore);
                    let client = Arc::clone(&self.client);
                    let resolver = Arc::clone(&self.resolver);
                    let retry = self.retry.clone();
                    tokio::spawn(async move {
                        fetch_one(id, &semaphore, &*client, &resolver, &retry).await
                    })
                })
                .collect();

            for task in join_all(tasks).await {
                match task {
                    Ok(Some(record)) => match self.repository.upsert(&record).await {
                        Ok(()) => loaded += 1,
                        Err(err) => {
                            error!("failed to save character {}: {err:#}", record.id);
                            errors += 1;
                        }
                    },
                    // Absent or malformed on the remote side; skipped silently
                    Ok(None) => {}
                    Err(err) => {
                        warn!("detail fetch task aborted: {err}");
                        errors += 1;
                    }
                }
            }

            self.reporter
                .progress(SyncProgress::new(
                    &self.session_id,
                    SyncStage::Persist,
                    loaded,
                    total,
                    format!("batch {} persisted", batch_index + 1),
                ))
                .await;
        }

        (loaded, errors)
    }

    fn summary(
        &self,
        started_at: chrono::DateTime<Utc>,
        run_started: Instant,
        found: u64,
        existing: u64,
        loaded: u64,
        errors: u64,
    ) -> SyncSummary {
        SyncSummary {
            session_id: self.session_id.clone(),
            found,
            existing,
            loaded,
            errors,
            duration_ms: run_started.elapsed().as_millis() as u64,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Fetch one character and resolve all its references into a persistable
/// record. `None` means the ID contributes nothing this run.
async fn fetch_one<C: CatalogClient>(
    id: i64,
    semaphore: &Semaphore,
    client: &C,
    resolver: &ReferenceResolver<C>,
    retry: &RetryPolicy,
) -> Option<CharacterRecord> {
    let _permit = semaphore.acquire().await.ok()?;

    let label = format!("character {id}");
    let properties = match retry.execute(&label, || client.fetch_character(id)).await {
        Ok(properties) => properties,
        Err(ApiError::NotFound { .. }) => {
            debug!("character {id} does not exist on the remote catalog");
            return None;
        }
        Err(err) => {
            warn!("skipping character {id}: {err}");
            return None;
        }
    };

    let (homeworld, films, species, starships, vehicles) = tokio::join!(
        resolver.resolve(properties.homeworld.as_deref(), ReferenceKind::Planet),
        resolver.resolve_list(&properties.films, ReferenceKind::Film),
        resolver.resolve_list(&properties.species, ReferenceKind::Species),
        resolver.resolve_list(&properties.starships, ReferenceKind::Starship),
        resolver.resolve_list(&properties.vehicles, ReferenceKind::Vehicle),
    );
    let references = ResolvedReferences {
        homeworld,
        films,
        species,
        starships,
        vehicles,
    };

    Some(CharacterRecord::from_properties(id, properties, references))
}
