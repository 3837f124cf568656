//! Persistence port for the orchestrator singleton.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::state::{
    ManagerRunStatus, OrchestratorEvent, OrchestratorState, StatePatch,
};
use crate::error::Result;

/// Partial update for one manager's persisted status entry.
#[derive(Debug, Clone, Default)]
pub struct ManagerStatusPatch {
    pub status: Option<ManagerRunStatus>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_error: Option<Option<String>>,
    pub items_collected: Option<u64>,
}

impl ManagerStatusPatch {
    #[must_use]
    pub fn running(status: ManagerRunStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn done(items_collected: u64) -> Self {
        Self {
            status: Some(ManagerRunStatus::Done),
            last_run_at: Some(Utc::now()),
            last_error: Some(None),
            items_collected: Some(items_collected),
        }
    }

    #[must_use]
    pub fn errored(message: impl Into<String>) -> Self {
        Self {
            status: Some(ManagerRunStatus::Error),
            last_error: Some(Some(message.into())),
            ..Self::default()
        }
    }
}

/// Storage for the singleton orchestration record.
///
/// These are the only mutation entry points; every other component reads and
/// writes exclusively through them so recovery and observability stay
/// consistent.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the singleton, creating it with defaults if absent.
    async fn load(&self) -> Result<OrchestratorState>;

    /// Merge-upsert a partial update; the store stamps `updated_at`.
    async fn save(&self, patch: StatePatch) -> Result<()>;

    /// Append to the bounded event log, dropping the oldest past the cap.
    async fn append_event(&self, event: OrchestratorEvent) -> Result<()>;

    /// Update one manager's status entry in place, or append it.
    async fn upsert_manager_status(&self, id: &str, patch: ManagerStatusPatch) -> Result<()>;

    /// Atomically acquire the consolidation mutual-exclusion flag.
    ///
    /// Returns `true` only for the single caller that observed the flag
    /// unset; everyone else must defer.
    async fn try_begin_consolidation(&self) -> Result<bool>;

    /// Release the consolidation flag.
    async fn end_consolidation(&self) -> Result<()>;

    /// Record `round` as fully consolidated, bumping the counter and the
    /// timestamp. Returns `false` without side effects when the round was
    /// already recorded.
    async fn mark_round_consolidated(&self, round: u32) -> Result<bool>;
}
