//! SQLite-backed state store using Diesel.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::model::StateRow;
use super::schema::orchestrator_state::dsl::{
    consolidation_in_progress, id as row_id, orchestrator_state, updated_at,
};
use super::DbPool;
use crate::domain::market::MarketStatus;
use crate::domain::phase::RoundPhase;
use crate::domain::state::{OrchestratorEvent, OrchestratorState, StatePatch, SINGLETON_KEY};
use crate::error::{Error, Result};
use crate::port::store::{ManagerStatusPatch, StateStore};

impl From<diesel::result::Error> for Error {
    fn from(e: diesel::result::Error) -> Self {
        Error::Database(e.to_string())
    }
}

/// The persisted singleton, one row per deployment.
pub struct SqliteStateStore {
    pool: DbPool,
}

impl SqliteStateStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<impl std::ops::DerefMut<Target = SqliteConnection>> {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }

    fn to_row(state: &OrchestratorState) -> Result<StateRow> {
        Ok(StateRow {
            id: SINGLETON_KEY.to_string(),
            status: state.status.map(MarketStatus::to_wire),
            previous_status: state.previous_status.map(MarketStatus::to_wire),
            round_number: state.round_number as i32,
            season: i32::from(state.season),
            phase: state.phase.as_str().to_string(),
            managers: serde_json::to_string(&state.managers)?,
            events: serde_json::to_string(&state.events)?,
            polling_enabled: state.polling_enabled,
            polling_interval_ms: state.polling_interval_ms as i64,
            last_poll_at: state.last_poll_at.map(|t| t.to_rfc3339()),
            consolidation_in_progress: state.consolidation_in_progress,
            last_consolidation_at: state.last_consolidation_at.map(|t| t.to_rfc3339()),
            consolidated_rounds: serde_json::to_string(&state.consolidated_rounds)?,
            total_transitions: state.total_transitions as i64,
            total_consolidations: state.total_consolidations as i64,
            total_errors: state.total_errors as i64,
            started_at: state.started_at.to_rfc3339(),
            updated_at: state.updated_at.to_rfc3339(),
        })
    }

    fn from_row(row: StateRow) -> Result<OrchestratorState> {
        let parse_status = |code: Option<i32>| -> Result<Option<MarketStatus>> {
            code.map(|c| {
                MarketStatus::from_wire(c)
                    .ok_or_else(|| Error::Parse(format!("unknown market status code {c}")))
            })
            .transpose()
        };

        Ok(OrchestratorState {
            status: parse_status(row.status)?,
            previous_status: parse_status(row.previous_status)?,
            round_number: row.round_number as u32,
            season: row.season as u16,
            phase: RoundPhase::parse(&row.phase)
                .ok_or_else(|| Error::Parse(format!("unknown phase '{}'", row.phase)))?,
            managers: serde_json::from_str(&row.managers)?,
            events: serde_json::from_str(&row.events)?,
            polling_enabled: row.polling_enabled,
            polling_interval_ms: row.polling_interval_ms as u64,
            last_poll_at: row.last_poll_at.as_deref().map(parse_rfc3339).transpose()?,
            consolidation_in_progress: row.consolidation_in_progress,
            last_consolidation_at: row
                .last_consolidation_at
                .as_deref()
                .map(parse_rfc3339)
                .transpose()?,
            consolidated_rounds: serde_json::from_str(&row.consolidated_rounds)?,
            total_transitions: row.total_transitions as u64,
            total_consolidations: row.total_consolidations as u64,
            total_errors: row.total_errors as u64,
            started_at: parse_rfc3339(&row.started_at)?,
            updated_at: parse_rfc3339(&row.updated_at)?,
        })
    }

    /// Read-modify-write the singleton inside one transaction, creating it
    /// with defaults when absent.
    fn modify<T>(&self, apply: impl FnOnce(&mut OrchestratorState) -> T) -> Result<T> {
        let mut conn = self.conn()?;
        conn.immediate_transaction::<T, Error, _>(|conn| {
            let row: Option<StateRow> = orchestrator_state
                .find(SINGLETON_KEY)
                .first(conn)
                .optional()?;

            let mut state = match row {
                Some(row) => Self::from_row(row)?,
                None => OrchestratorState::new(),
            };
            let out = apply(&mut state);
            state.updated_at = Utc::now();

            diesel::replace_into(orchestrator_state)
                .values(Self::to_row(&state)?)
                .execute(conn)?;
            Ok(out)
        })
    }
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Parse(e.to_string()))
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn load(&self) -> Result<OrchestratorState> {
        self.modify(|_| ())?;
        let mut conn = self.conn()?;
        let row: StateRow = orchestrator_state.find(SINGLETON_KEY).first(&mut *conn)?;
        Self::from_row(row)
    }

    async fn save(&self, patch: StatePatch) -> Result<()> {
        self.modify(|state| state.apply(patch))
    }

    async fn append_event(&self, event: OrchestratorEvent) -> Result<()> {
        self.modify(|state| state.push_event(event))
    }

    async fn upsert_manager_status(&self, manager_id: &str, patch: ManagerStatusPatch) -> Result<()> {
        self.modify(|state| {
            state.upsert_manager(manager_id, |entry| {
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
        })
    }

    async fn try_begin_consolidation(&self) -> Result<bool> {
        // Ensure the row exists before the conditional update.
        self.modify(|_| ())?;
        let mut conn = self.conn()?;
        let changed = diesel::update(
            orchestrator_state
                .filter(row_id.eq(SINGLETON_KEY))
                .filter(consolidation_in_progress.eq(false)),
        )
        .set((
            consolidation_in_progress.eq(true),
            updated_at.eq(Utc::now().to_rfc3339()),
        ))
        .execute(&mut *conn)?;
        Ok(changed == 1)
    }

    async fn end_consolidation(&self) -> Result<()> {
        self.modify(|state| state.consolidation_in_progress = false)
    }

    async fn mark_round_consolidated(&self, round: u32) -> Result<bool> {
        self.modify(|state| {
            if !state.consolidated_rounds.insert(round) {
                return false;
            }
            state.total_consolidations += 1;
            state.last_consolidation_at = Some(Utc::now());
            true
        })
    }
}
