//! Handler for the `status` command.

use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::adapter::store::{create_pool, run_migrations};
use crate::adapter::SqliteStateStore;
use crate::config::Config;
use crate::domain::state::{ManagerRunStatus, OrchestratorState};
use crate::error::Result;
use crate::port::store::StateStore;

#[derive(Tabled)]
struct ManagerRow {
    #[tabled(rename = "Manager")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Items")]
    items: u64,
    #[tabled(rename = "Last run")]
    last_run: String,
    #[tabled(rename = "Last error")]
    last_error: String,
}

/// Execute the status command.
pub async fn execute(config: Config) -> Result<()> {
    let pool = create_pool(&config.database)?;
    run_migrations(&pool)?;
    let store = SqliteStateStore::new(pool);
    let state = store.load().await?;

    print_summary(&state);
    print_managers(&state);
    print_events(&state);
    Ok(())
}

fn print_summary(state: &OrchestratorState) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("roundlord v{version}");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let market = state
        .status
        .map_or("unknown".to_string(), |s| s.label().to_string());
    println!("Market:         {market}");
    println!(
        "Round:          {} (season {})",
        state.round_number, state.season
    );
    println!("Phase:          {}", state.phase.as_str().bold());
    if state.polling_enabled {
        println!("Polling:        {} every {}ms", "● on".green(), state.polling_interval_ms);
    } else {
        println!("Polling:        {}", "○ off".red());
    }
    if state.consolidation_in_progress {
        println!("Consolidation:  {}", "in progress".yellow());
    }
    if let Some(at) = state.last_poll_at {
        println!("Last poll:      {}", at.to_rfc3339());
    }
    if let Some(at) = state.last_consolidation_at {
        println!("Last consolid.: {}", at.to_rfc3339());
    }
    println!(
        "Totals:         {} transitions, {} consolidations, {} errors",
        state.total_transitions, state.total_consolidations, state.total_errors
    );
    if !state.consolidated_rounds.is_empty() {
        let rounds: Vec<String> = state
            .consolidated_rounds
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("Consolidated:   rounds {}", rounds.join(", "));
    }
}

fn print_managers(state: &OrchestratorState) {
    if state.managers.is_empty() {
        println!();
        println!("No manager activity recorded yet.");
        return;
    }

    let rows: Vec<ManagerRow> = state
        .managers
        .iter()
        .map(|m| ManagerRow {
            id: m.id.clone(),
            status: status_label(m.status),
            items: m.items_collected,
            last_run: m
                .last_run_at
                .map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            last_error: m.last_error.clone().unwrap_or_else(|| "-".into()),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!();
    println!("{table}");
}

fn print_events(state: &OrchestratorState) {
    if state.events.is_empty() {
        return;
    }
    println!();
    println!("Recent events:");
    for event in state.events.iter().rev().take(10) {
        let round = event
            .round_number
            .map_or(String::new(), |r| format!(" r{r}"));
        let details = event.details.as_deref().unwrap_or("");
        println!(
            "  {} {:?}{round} {details}",
            event.timestamp.format("%H:%M:%S"),
            event.kind
        );
    }
}

fn status_label(status: ManagerRunStatus) -> String {
    match status {
        ManagerRunStatus::Idle => "idle".to_string(),
        ManagerRunStatus::Collecting => "collecting".yellow().to_string(),
        ManagerRunStatus::Processing => "processing".yellow().to_string(),
        ManagerRunStatus::Consolidating => "consolidating".yellow().to_string(),
        ManagerRunStatus::Error => "error".red().to_string(),
        ManagerRunStatus::Done => "done".green().to_string(),
    }
}
