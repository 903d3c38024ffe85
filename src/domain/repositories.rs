//! Repository interfaces for the character store
//!
//! Contains trait definitions for data access patterns used by the
//! synchronization engine and the post-run inspection report.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;

use crate::domain::character::CharacterRecord;

#[async_trait]
pub trait CharacterRepository: Send + Sync {
    /// IDs already persisted; read once at the start of a run to diff
    /// against discovered IDs.
    async fn existing_ids(&self) -> Result<HashSet<i64>>;

    /// Insert-or-replace keyed by `id`, one transaction per record.
    /// `created_at` is preserved across replays.
    async fn upsert(&self, record: &CharacterRecord) -> Result<()>;

    async fn find_by_id(&self, id: i64) -> Result<Option<CharacterRecord>>;

    async fn count(&self) -> Result<u64>;

    // Inspection queries backing the post-run report
    async fn id_range(&self) -> Result<Option<(i64, i64)>>;
    async fn known_homeworld_count(&self) -> Result<u64>;
}
