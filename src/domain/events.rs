//! Event types emitted while a synchronization run is in flight
//!
//! These are consumed by the progress reporter only; nothing in the engine
//! reads them back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents the current stage of the synchronization process
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SyncStage {
    /// Enumerating remote character IDs (pagination walk / range probe)
    Discovery,
    /// Comparing discovered IDs with the local store
    Diff,
    /// Fetching full records for missing IDs
    DetailFetch,
    /// Writing fetched records to the store
    Persist,
}

impl std::fmt::Display for SyncStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStage::Discovery => write!(f, "id discovery"),
            SyncStage::Diff => write!(f, "diff against store"),
            SyncStage::DetailFetch => write!(f, "detail fetch"),
            SyncStage::Persist => write!(f, "persist"),
        }
    }
}

/// Progress snapshot for one stage of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncProgress {
    pub session_id: String,
    pub stage: SyncStage,
    /// Current progress count
    pub current: u64,
    /// Total expected items, best-effort (0 when unknown)
    pub total: u64,
    /// Progress percentage (0.0 to 100.0)
    pub percentage: f64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl SyncProgress {
    pub fn new(
        session_id: &str,
        stage: SyncStage,
        current: u64,
        total: u64,
        message: impl Into<String>,
    ) -> Self {
        let percentage = if total > 0 {
            (current as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        Self {
            session_id: session_id.to_string(),
            stage,
            current,
            total,
            percentage,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Final outcome of one synchronization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSummary {
    pub session_id: String,
    /// Distinct IDs discovered on the remote catalog
    pub found: u64,
    /// Discovered IDs that were already present locally
    pub existing: u64,
    /// Records fetched and saved during this run
    pub loaded: u64,
    /// Fetch or persistence failures (skipped records)
    pub errors: u64,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncSummary {
    /// True when discovery found nothing to synchronize.
    pub fn is_empty_run(&self) -> bool {
        self.found == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percentage_is_computed() {
        let progress = SyncProgress::new("s", SyncStage::DetailFetch, 5, 20, "saving");
        assert!((progress.percentage - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn progress_with_unknown_total_reports_zero_percent() {
        let progress = SyncProgress::new("s", SyncStage::Discovery, 12, 0, "walking pages");
        assert_eq!(progress.percentage, 0.0);
    }
}
