//! The persisted orchestrator state record.
//!
//! Exactly one record exists per deployment, created lazily on first load and
//! never deleted. It is the sole source of truth for resuming work after a
//! process restart.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::market::MarketStatus;
use super::phase::RoundPhase;

/// Fixed key identifying the singleton record.
pub const SINGLETON_KEY: &str = "singleton";

/// Ring-buffer cap on the persisted event log.
pub const EVENT_LOG_CAP: usize = 50;

/// Default polling interval in milliseconds.
pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 120_000;

/// Per-manager run status as persisted for dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerRunStatus {
    Idle,
    Collecting,
    Processing,
    Consolidating,
    Error,
    Done,
}

/// Persisted status entry for one registered manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerState {
    pub id: String,
    pub status: ManagerRunStatus,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub items_collected: u64,
}

impl ManagerState {
    #[must_use]
    pub fn idle(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: ManagerRunStatus::Idle,
            last_run_at: None,
            last_error: None,
            items_collected: 0,
        }
    }
}

/// Kinds of entries in the bounded event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    MarketTransition,
    PollError,
    HookFailed,
    HookTimedOut,
    ConsolidationStarted,
    ConsolidationCompleted,
    ConsolidationSkipped,
    ConsolidationDeferred,
    PhaseChanged,
    SeasonRollover,
    Recovery,
}

/// One entry in the bounded event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorEvent {
    pub kind: EventKind,
    pub from: Option<MarketStatus>,
    pub to: Option<MarketStatus>,
    pub round_number: Option<u32>,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl OrchestratorEvent {
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            from: None,
            to: None,
            round_number: None,
            details: None,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn round(mut self, round_number: u32) -> Self {
        self.round_number = Some(round_number);
        self
    }

    #[must_use]
    pub fn statuses(mut self, from: Option<MarketStatus>, to: MarketStatus) -> Self {
        self.from = from;
        self.to = Some(to);
        self
    }

    #[must_use]
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// The singleton orchestration record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorState {
    pub status: Option<MarketStatus>,
    pub previous_status: Option<MarketStatus>,
    pub round_number: u32,
    pub season: u16,
    pub phase: RoundPhase,

    pub managers: Vec<ManagerState>,
    pub events: Vec<OrchestratorEvent>,

    pub polling_enabled: bool,
    pub polling_interval_ms: u64,
    pub last_poll_at: Option<DateTime<Utc>>,

    pub consolidation_in_progress: bool,
    pub last_consolidation_at: Option<DateTime<Utc>>,
    pub consolidated_rounds: BTreeSet<u32>,

    pub total_transitions: u64,
    pub total_consolidations: u64,
    pub total_errors: u64,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrchestratorState {
    /// Fresh record with defaults, used on first load.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            status: None,
            previous_status: None,
            round_number: 0,
            season: 0,
            phase: RoundPhase::Awaiting,
            managers: Vec::new(),
            events: Vec::new(),
            polling_enabled: true,
            polling_interval_ms: DEFAULT_POLLING_INTERVAL_MS,
            last_poll_at: None,
            consolidation_in_progress: false,
            last_consolidation_at: None,
            consolidated_rounds: BTreeSet::new(),
            total_transitions: 0,
            total_consolidations: 0,
            total_errors: 0,
            started_at: now,
            updated_at: now,
        }
    }

    /// Append an event, silently dropping the oldest past the cap.
    pub fn push_event(&mut self, event: OrchestratorEvent) {
        self.events.push(event);
        if self.events.len() > EVENT_LOG_CAP {
            let excess = self.events.len() - EVENT_LOG_CAP;
            self.events.drain(..excess);
        }
    }

    /// Update the entry for `id` in place, or append a fresh one.
    pub fn upsert_manager(&mut self, id: &str, apply: impl FnOnce(&mut ManagerState)) {
        if let Some(entry) = self.managers.iter_mut().find(|m| m.id == id) {
            apply(entry);
        } else {
            let mut entry = ManagerState::idle(id);
            apply(&mut entry);
            self.managers.push(entry);
        }
    }

    /// Merge a partial update into this record. Counters accumulate; plain
    /// fields overwrite only when the patch carries them.
    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(status) = patch.status {
            self.status = Some(status);
        }
        if let Some(previous) = patch.previous_status {
            self.previous_status = Some(previous);
        }
        if let Some(round) = patch.round_number {
            self.round_number = round;
        }
        if let Some(season) = patch.season {
            self.season = season;
        }
        if let Some(phase) = patch.phase {
            self.phase = phase;
        }
        if let Some(enabled) = patch.polling_enabled {
            self.polling_enabled = enabled;
        }
        if let Some(interval) = patch.polling_interval_ms {
            self.polling_interval_ms = interval;
        }
        if let Some(at) = patch.last_poll_at {
            self.last_poll_at = Some(at);
        }
        if patch.increment_transitions {
            self.total_transitions += 1;
        }
        if patch.increment_errors {
            self.total_errors += 1;
        }
        self.updated_at = Utc::now();
    }
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial update merged into the singleton by [`StateStore::save`].
///
/// [`StateStore::save`]: crate::port::store::StateStore::save
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub status: Option<MarketStatus>,
    pub previous_status: Option<MarketStatus>,
    pub round_number: Option<u32>,
    pub season: Option<u16>,
    pub phase: Option<RoundPhase>,
    pub polling_enabled: Option<bool>,
    pub polling_interval_ms: Option<u64>,
    pub last_poll_at: Option<DateTime<Utc>>,
    pub increment_transitions: bool,
    pub increment_errors: bool,
}

impl StatePatch {
    #[must_use]
    pub fn phase(phase: RoundPhase) -> Self {
        Self {
            phase: Some(phase),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn error_counted() -> Self {
        Self {
            increment_errors: true,
            ..Self::default()
        }
    }
}
