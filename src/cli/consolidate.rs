//! Handler for the `consolidate` command.
//!
//! Runs the same guarded finalize/consolidate pass the scheduler would,
//! without touching the phase machine, so an operator can redo a round after
//! fixing a failing module. A round already marked consolidated is skipped.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::adapter::store::{create_pool, run_migrations};
use crate::adapter::{SqliteStateStore, StaticTenantDirectory};
use crate::application::dispatcher::LifecycleDispatcher;
use crate::catalog;
use crate::config::Config;
use crate::error::Result;

/// Execute the consolidate command.
pub async fn execute(config: Config, round: u32) -> Result<()> {
    config.init_logging();

    let pool = create_pool(&config.database)?;
    run_migrations(&pool)?;
    let store = Arc::new(SqliteStateStore::new(pool));

    let registry = Arc::new(catalog::default_registry()?);
    let tenants = Arc::new(StaticTenantDirectory::new(config.active_tenants()));

    let dispatcher = LifecycleDispatcher::new(
        registry,
        store,
        tenants,
        Duration::from_millis(config.polling.hook_timeout_ms),
    );

    dispatcher.force_consolidation(round).await?;
    info!(round, "Consolidation pass finished");
    Ok(())
}
