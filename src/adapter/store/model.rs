//! Row model for the persisted singleton.

use diesel::prelude::*;

use super::schema::orchestrator_state;

/// The singleton row. Collections are stored as JSON text, timestamps as
/// RFC 3339 strings, market statuses as their feed wire codes.
#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = orchestrator_state)]
pub struct StateRow {
    pub id: String,
    pub status: Option<i32>,
    pub previous_status: Option<i32>,
    pub round_number: i32,
    pub season: i32,
    pub phase: String,
    pub managers: String,
    pub events: String,
    pub polling_enabled: bool,
    pub polling_interval_ms: i64,
    pub last_poll_at: Option<String>,
    pub consolidation_in_progress: bool,
    pub last_consolidation_at: Option<String>,
    pub consolidated_rounds: String,
    pub total_transitions: i64,
    pub total_consolidations: i64,
    pub total_errors: i64,
    pub started_at: String,
    pub updated_at: String,
}
