//! Handler for the `run` command.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;
use url::Url;

use crate::adapter::store::{create_pool, run_migrations};
use crate::adapter::{HttpMarketFeed, SqliteStateStore, StaticTenantDirectory};
use crate::application::dispatcher::LifecycleDispatcher;
use crate::application::scheduler::PollingScheduler;
use crate::application::watcher::MarketWatcher;
use crate::catalog;
use crate::config::Config;
use crate::error::Result;

use super::RunArgs;

/// Wire the orchestrator from config and run it until shutdown.
pub async fn execute(args: RunArgs, mut config: Config) -> Result<()> {
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if args.json_logs {
        config.logging.format = "json".into();
    }
    config.init_logging();

    info!(version = env!("CARGO_PKG_VERSION"), "roundlord starting");

    let pool = create_pool(&config.database)?;
    run_migrations(&pool)?;
    let store = Arc::new(SqliteStateStore::new(pool));

    let feed = Arc::new(HttpMarketFeed::new(
        Url::parse(&config.feed.status_url)?,
        Duration::from_secs(config.feed.timeout_secs),
    )?);

    // A bad dependency graph must stop the process before any polling.
    let registry = Arc::new(catalog::default_registry()?);
    info!(
        managers = registry.len(),
        order = ?registry.resolve_order(),
        "Manager registry built"
    );

    let tenants = Arc::new(StaticTenantDirectory::new(config.active_tenants()));

    let watcher = MarketWatcher::new(feed, store.clone());
    let dispatcher = LifecycleDispatcher::new(
        registry,
        store.clone(),
        tenants,
        Duration::from_millis(config.polling.hook_timeout_ms),
    );
    let scheduler = PollingScheduler::new(
        watcher,
        dispatcher,
        store,
        Duration::from_millis(config.polling.interval_ms),
    );

    if args.once {
        scheduler.tick().await;
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    scheduler.run(shutdown_rx).await
}
