//! In-memory state store for tests and ephemeral runs.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::domain::state::{OrchestratorEvent, OrchestratorState, StatePatch};
use crate::error::Result;
use crate::port::store::{ManagerStatusPatch, StateStore};

/// In-memory singleton store. The single lock makes every operation an
/// atomic read-modify-write, which is exactly what the consolidation flag
/// needs.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<OrchestratorState>,
}

impl MemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<OrchestratorState> {
        Ok(self.state.lock().clone())
    }

    async fn save(&self, patch: StatePatch) -> Result<()> {
        self.state.lock().apply(patch);
        Ok(())
    }

    async fn append_event(&self, event: OrchestratorEvent) -> Result<()> {
        let mut state = self.state.lock();
        state.push_event(event);
        state.updated_at = Utc::now();
        Ok(())
    }

    async fn upsert_manager_status(&self, id: &str, patch: ManagerStatusPatch) -> Result<()> {
        let mut state = self.state.lock();
        state.upsert_manager(id, |entry| {
            if let Some(status) = patch.status {
                entry.status = status;
            }
            if let Some(at) = patch.last_run_at {
                entry.last_run_at = Some(at);
            }
            if let Some(error) = patch.last_error.clone() {
                entry.last_error = error;
            }
            if let Some(items) = patch.items_collected {
                entry.items_collected = items;
            }
        });
        state.updated_at = Utc::now();
        Ok(())
    }

    async fn try_begin_consolidation(&self) -> Result<bool> {
        let mut state = self.state.lock();
        if state.consolidation_in_progress {
            return Ok(false);
        }
        state.consolidation_in_progress = true;
        state.updated_at = Utc::now();
        Ok(true)
    }

    async fn end_consolidation(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.consolidation_in_progress = false;
        state.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_round_consolidated(&self, round: u32) -> Result<bool> {
        let mut state = self.state.lock();
        if !state.consolidated_rounds.insert(round) {
            return Ok(false);
        }
        state.total_consolidations += 1;
        state.last_consolidation_at = Some(Utc::now());
        state.updated_at = Utc::now();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::{EventKind, ManagerRunStatus, EVENT_LOG_CAP};

    #[tokio::test]
    async fn lazy_singleton_starts_with_defaults() {
        let store = MemoryStateStore::new();
        let state = store.load().await.unwrap();
        assert_eq!(state.total_transitions, 0);
        assert!(state.polling_enabled);
        assert!(state.consolidated_rounds.is_empty());
    }

    #[tokio::test]
    async fn event_log_stays_bounded() {
        let store = MemoryStateStore::new();
        for i in 0..(EVENT_LOG_CAP as u32 + 25) {
            store
                .append_event(OrchestratorEvent::new(EventKind::PhaseChanged).round(i))
                .await
                .unwrap();
        }
        let state = store.load().await.unwrap();
        assert_eq!(state.events.len(), EVENT_LOG_CAP);
        assert_eq!(state.events.last().unwrap().round_number, Some(74));
    }

    #[tokio::test]
    async fn consolidation_flag_admits_one() {
        let store = MemoryStateStore::new();
        assert!(store.try_begin_consolidation().await.unwrap());
        assert!(!store.try_begin_consolidation().await.unwrap());
        store.end_consolidation().await.unwrap();
        assert!(store.try_begin_consolidation().await.unwrap());
    }

    #[tokio::test]
    async fn round_is_marked_once() {
        let store = MemoryStateStore::new();
        assert!(store.mark_round_consolidated(11).await.unwrap());
        assert!(!store.mark_round_consolidated(11).await.unwrap());
        let state = store.load().await.unwrap();
        assert_eq!(state.total_consolidations, 1);
        assert!(state.consolidated_rounds.contains(&11));
    }

    #[tokio::test]
    async fn manager_status_upserts_in_place() {
        let store = MemoryStateStore::new();
        store
            .upsert_manager_status(
                "round_data",
                ManagerStatusPatch::running(ManagerRunStatus::Processing),
            )
            .await
            .unwrap();
        store
            .upsert_manager_status("round_data", ManagerStatusPatch::done(42))
            .await
            .unwrap();

        let state = store.load().await.unwrap();
        assert_eq!(state.managers.len(), 1);
        assert_eq!(state.managers[0].status, ManagerRunStatus::Done);
        assert_eq!(state.managers[0].items_collected, 42);
        assert!(state.managers[0].last_run_at.is_some());
    }
}
