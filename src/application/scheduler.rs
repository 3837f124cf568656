//! The single polling loop that drives the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::domain::state::{EventKind, OrchestratorEvent, StatePatch};
use crate::error::Result;
use crate::port::store::StateStore;

use super::dispatcher::LifecycleDispatcher;
use super::watcher::MarketWatcher;

/// Drives the watcher and dispatcher on a fixed interval.
///
/// Exactly one scheduler may run against a given persisted state; there is no
/// leader election. Shutdown is cooperative: the signal stops future ticks
/// while an in-flight dispatch runs to completion, so financial-writing
/// hooks are never aborted mid-write.
pub struct PollingScheduler {
    watcher: MarketWatcher,
    dispatcher: LifecycleDispatcher,
    store: Arc<dyn StateStore>,
    interval: Duration,
}

impl PollingScheduler {
    pub fn new(
        watcher: MarketWatcher,
        dispatcher: LifecycleDispatcher,
        store: Arc<dyn StateStore>,
        interval: Duration,
    ) -> Self {
        Self {
            watcher,
            dispatcher,
            store,
            interval,
        }
    }

    /// Run until the shutdown signal flips to `true` or its sender drops.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        self.reconcile_on_start().await?;

        // First verification immediately, then on the interval.
        self.tick().await;

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.reset();

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    match result {
                        Ok(()) => {
                            if *shutdown.borrow() {
                                info!("Shutdown signal received");
                                break;
                            }
                        }
                        Err(_) => {
                            info!("Shutdown channel closed");
                            break;
                        }
                    }
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        self.store
            .save(StatePatch {
                polling_enabled: Some(false),
                ..StatePatch::default()
            })
            .await?;
        info!("Scheduler stopped");
        Ok(())
    }

    /// One poll/dispatch cycle. Never propagates: every failure is counted
    /// and retried on the next tick.
    pub async fn tick(&self) {
        match self.store.load().await {
            Ok(state) if !state.polling_enabled => {
                debug!("Polling disabled, skipping tick");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Could not check polling flag");
                return;
            }
        }

        let signal = self.watcher.poll().await;
        if let Err(e) = self.dispatcher.dispatch(signal).await {
            error!(error = %e, "Dispatch failed");
            self.store.save(StatePatch::error_counted()).await.ok();
        }
    }

    /// Load persisted state and make a restart safe.
    ///
    /// A mid-cycle phase is not trusted blindly: the next poll re-reads the
    /// live market and the consolidated-rounds set plus the consolidation
    /// flag make any re-dispatch idempotent. A flag left set by a crash is
    /// released here, otherwise every future pass would defer forever.
    async fn reconcile_on_start(&self) -> Result<()> {
        let state = self.store.load().await?;

        if state.phase.is_mid_cycle() {
            info!(
                phase = state.phase.as_str(),
                round = state.round_number,
                "Restarted mid-cycle, reconciling against live market"
            );
        }

        if state.consolidation_in_progress {
            warn!("Stale consolidation flag found on startup, releasing");
            self.store.end_consolidation().await?;
            self.store
                .append_event(
                    OrchestratorEvent::new(EventKind::Recovery)
                        .details("released stale consolidation flag on startup"),
                )
                .await?;
        }

        self.store
            .save(StatePatch {
                polling_enabled: Some(true),
                polling_interval_ms: Some(self.interval.as_millis() as u64),
                ..StatePatch::default()
            })
            .await?;

        info!(
            interval_ms = self.interval.as_millis() as u64,
            "Scheduler active, monitoring market"
        );
        Ok(())
    }
}
