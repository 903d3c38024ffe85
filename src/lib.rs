//! swapi-sync - incremental catalog synchronization
//!
//! This crate synchronizes a local SQLite store with a paginated remote
//! character catalog: it discovers the remote ID space, diffs it against
//! already-persisted records, fetches only missing entities under bounded
//! concurrency with retry/backoff, resolves nested resource references
//! through a run-scoped cache, and persists results idempotently.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export the run-facing surface for binaries and tests
pub use application::{LogReporter, ProgressReporter};
pub use domain::{
    CharacterProperties, CharacterRecord, CharacterRepository, ResolvedReferences, SyncProgress,
    SyncStage, SyncSummary, UNKNOWN,
};
pub use infrastructure::{
    ApiError, AppConfig, CatalogClient, ConfigManager, DatabaseConnection, HttpCatalogClient,
    HttpClient, HttpClientConfig, ReferenceKind, ReferenceResolver, RetryPolicy,
    SqliteCharacterRepository, SyncConfig, SyncEngine,
};
