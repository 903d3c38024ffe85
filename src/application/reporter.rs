//! Progress reporting for synchronization runs
//!
//! The engine emits stage transitions, per-batch progress ticks, and a
//! final summary. Reporting is fire-and-forget: a reporter must never fail
//! the run, so the trait methods return nothing.

use async_trait::async_trait;

use crate::domain::events::{SyncProgress, SyncStage, SyncSummary};

/// Consumer of synchronization progress events.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn stage_started(&self, stage: SyncStage, message: &str);

    async fn progress(&self, progress: SyncProgress);

    async fn completed(&self, summary: &SyncSummary);
}

/// Reporter that narrates the run through the tracing subscriber.
#[derive(Debug, Default, Clone)]
pub struct LogReporter;

impl LogReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProgressReporter for LogReporter {
    async fn stage_started(&self, stage: SyncStage, message: &str) {
        tracing::info!("[{stage}] {message}");
    }

    async fn progress(&self, progress: SyncProgress) {
        tracing::info!(
            "[{}] {}/{} ({:.1}%) - {}",
            progress.stage,
            progress.current,
            progress.total,
            progress.percentage,
            progress.message
        );
    }

    async fn completed(&self, summary: &SyncSummary) {
        if summary.is_empty_run() {
            tracing::warn!(
                "synchronization found nothing to do (session {})",
                summary.session_id
            );
            return;
        }
        tracing::info!(
            "synchronization finished in {}ms: found {}, already present {}, loaded {}, errors {} (session {})",
            summary.duration_ms,
            summary.found,
            summary.existing,
            summary.loaded,
            summary.errors,
            summary.session_id
        );
    }
}
