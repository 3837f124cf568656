//! Lifecycle dispatcher: maps transitions to manager hooks.
//!
//! Hooks execute strictly in registry order, each inside an isolating error
//! boundary with a timeout, so one module's failure never halts siblings or
//! other tenants. The finalize/consolidate pass is additionally guarded by
//! the persisted mutual-exclusion flag and the consolidated-rounds set.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::market::{MarketStatus, Signal, Transition, TransitionEvent};
use crate::domain::phase::RoundPhase;
use crate::domain::state::{EventKind, ManagerRunStatus, OrchestratorEvent, StatePatch};
use crate::domain::tenant::Tenant;
use crate::error::Result;
use crate::port::manager::{Hook, HookContext, Manager};
use crate::port::store::{ManagerStatusPatch, StateStore};
use crate::port::tenant::TenantDirectory;

use super::registry::ManagerRegistry;

/// Invokes manager hooks for classified market signals.
pub struct LifecycleDispatcher {
    registry: Arc<ManagerRegistry>,
    store: Arc<dyn StateStore>,
    tenants: Arc<dyn TenantDirectory>,
    hook_timeout: Duration,
}

impl LifecycleDispatcher {
    pub fn new(
        registry: Arc<ManagerRegistry>,
        store: Arc<dyn StateStore>,
        tenants: Arc<dyn TenantDirectory>,
        hook_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            tenants,
            hook_timeout,
        }
    }

    /// Handle one poll signal.
    ///
    /// Only storage failures surface as errors; hook failures are isolated
    /// and recorded inside.
    pub async fn dispatch(&self, signal: Signal) -> Result<()> {
        match signal {
            Signal::Idle => self.on_idle().await,
            Signal::StillInRound {
                round_number,
                season,
            } => self.on_still_in_round(round_number, season).await,
            Signal::Transition(ev) => match ev.kind {
                Transition::RoundStarted => self.on_round_started(&ev).await,
                Transition::RoundFinalized => self.on_round_finalized(&ev).await,
                Transition::MarketReopened => self.on_market_reopened(&ev).await,
                Transition::SeasonEnded | Transition::SeasonReset => {
                    self.on_season_boundary(&ev).await
                }
            },
        }
    }

    /// Manual consolidation, same guards as the automatic path.
    ///
    /// Does not touch the phase machine, so it is safe to trigger from an
    /// admin surface at any point in the cycle.
    pub async fn force_consolidation(&self, round: u32) -> Result<()> {
        info!(round, "Forced consolidation requested");
        let state = self.store.load().await?;
        let tenants = self.tenants.active_tenants().await?;
        self.run_finalize_consolidate(round, state.season, &tenants, false)
            .await
    }

    // ------------------------------------------------------------------
    // Signal handlers
    // ------------------------------------------------------------------

    /// Nothing changed. Recover stuck phases and resume interrupted
    /// consolidation passes left behind by a crash or a deferral.
    async fn on_idle(&self) -> Result<()> {
        let state = self.store.load().await?;
        let market_open = matches!(
            state.status,
            Some(MarketStatus::Open | MarketStatus::Finalized)
        );

        match state.phase {
            RoundPhase::Failed if market_open => {
                self.store
                    .append_event(
                        OrchestratorEvent::new(EventKind::Recovery)
                            .details("recovered from failed phase"),
                    )
                    .await?;
                self.set_phase(RoundPhase::Awaiting).await
            }
            RoundPhase::Completed if market_open => self.set_phase(RoundPhase::Awaiting).await,
            RoundPhase::Finalizing | RoundPhase::Consolidating
                if market_open && !state.consolidation_in_progress =>
            {
                // A finalize pass never finished. Attribute it to the round
                // that was running: the feed already advanced past an Open
                // reopen, but not past a Finalized stop.
                let pending = if state.status == Some(MarketStatus::Open) {
                    state.round_number.saturating_sub(1)
                } else {
                    state.round_number
                };
                if state.consolidated_rounds.contains(&pending) {
                    return self.set_phase(RoundPhase::Awaiting).await;
                }
                info!(round = pending, "Resuming interrupted consolidation");
                let tenants = self.tenants.active_tenants().await?;
                self.run_finalize_consolidate(pending, state.season, &tenants, true)
                    .await
            }
            _ => Ok(()),
        }
    }

    /// Market still closed: drive live updates for data-collecting managers.
    async fn on_still_in_round(&self, round: u32, season: u16) -> Result<()> {
        let state = self.store.load().await?;
        match state.phase {
            RoundPhase::LiveUpdating => {
                let tenants = self.tenants.active_tenants().await?;
                self.run_hook_for_all(Hook::LiveUpdate, round, season, &tenants, true)
                    .await?;
                Ok(())
            }
            RoundPhase::Collecting => {
                self.set_phase(RoundPhase::LiveUpdating).await?;
                let tenants = self.tenants.active_tenants().await?;
                self.run_hook_for_all(Hook::LiveUpdate, round, season, &tenants, true)
                    .await?;
                Ok(())
            }
            RoundPhase::Awaiting | RoundPhase::Completed => {
                // The close transition happened while we were not looking
                // (restart or downtime): run the collect flow now.
                self.store
                    .append_event(
                        OrchestratorEvent::new(EventKind::PhaseChanged)
                            .round(round)
                            .details("market already closed; missed close transition"),
                    )
                    .await?;
                self.start_round(round, season).await
            }
            RoundPhase::Failed => {
                self.store
                    .append_event(
                        OrchestratorEvent::new(EventKind::Recovery)
                            .details("recovered from failed phase"),
                    )
                    .await?;
                self.set_phase(RoundPhase::Awaiting).await
            }
            RoundPhase::Finalizing | RoundPhase::Consolidating => {
                warn!(round, "Market closed again while finalizing; waiting");
                Ok(())
            }
        }
    }

    /// Open -> Closed: a new round began.
    async fn on_round_started(&self, ev: &TransitionEvent) -> Result<()> {
        info!(round = ev.round_number, "Market closed, round in progress");
        self.start_round(ev.round_number, ev.season).await
    }

    async fn start_round(&self, round: u32, season: u16) -> Result<()> {
        self.set_phase(RoundPhase::Collecting).await?;
        let tenants = self.tenants.active_tenants().await?;
        self.run_hook_for_all(Hook::MarketClose, round, season, &tenants, false)
            .await?;
        self.set_phase(RoundPhase::LiveUpdating).await
    }

    /// Closed -> Open | Finalized: the running round ended.
    async fn on_round_finalized(&self, ev: &TransitionEvent) -> Result<()> {
        let round = ev.round_number;
        info!(round, "Round finished, starting finalize/consolidate");
        let tenants = self.tenants.active_tenants().await?;
        self.run_finalize_consolidate(round, ev.season, &tenants, true)
            .await
    }

    /// Finalized -> Open: the round was already consolidated, just reset.
    async fn on_market_reopened(&self, ev: &TransitionEvent) -> Result<()> {
        let tenants = self.tenants.active_tenants().await?;
        self.run_hook_for_all(Hook::MarketOpen, ev.round_number, ev.season, &tenants, false)
            .await?;
        self.set_phase(RoundPhase::Awaiting).await
    }

    /// Season ended or reset: let managers prepare for the next season.
    async fn on_season_boundary(&self, ev: &TransitionEvent) -> Result<()> {
        info!(kind = ?ev.kind, season = ev.season, "Season boundary");
        let tenants = self.tenants.active_tenants().await?;
        self.run_hook_for_all(Hook::PreSeason, ev.round_number, ev.season, &tenants, false)
            .await?;
        self.store
            .append_event(
                OrchestratorEvent::new(EventKind::SeasonRollover)
                    .round(ev.round_number)
                    .details(format!("{:?}", ev.kind)),
            )
            .await?;
        self.set_phase(RoundPhase::Awaiting).await
    }

    // ------------------------------------------------------------------
    // Finalize / consolidate pass
    // ------------------------------------------------------------------

    /// The guarded finalize -> consolidate pass for one round.
    ///
    /// Idempotence: a round already in `consolidated_rounds` is skipped with
    /// an informational event. Mutual exclusion: the persisted flag admits a
    /// single pass at a time, globally across tenants; losers defer to a
    /// later tick.
    async fn run_finalize_consolidate(
        &self,
        round: u32,
        season: u16,
        tenants: &[Tenant],
        manage_phase: bool,
    ) -> Result<()> {
        let state = self.store.load().await?;
        if state.consolidated_rounds.contains(&round) {
            info!(round, "Round already consolidated, skipping");
            self.store
                .append_event(
                    OrchestratorEvent::new(EventKind::ConsolidationSkipped)
                        .round(round)
                        .details("round already consolidated"),
                )
                .await?;
            if manage_phase {
                self.set_phase(RoundPhase::Awaiting).await?;
            }
            return Ok(());
        }

        if !self.store.try_begin_consolidation().await? {
            warn!(round, "Consolidation already in progress, deferring");
            self.store
                .append_event(
                    OrchestratorEvent::new(EventKind::ConsolidationDeferred)
                        .round(round)
                        .details("consolidation flag held by another pass"),
                )
                .await?;
            return Ok(());
        }

        let pass = self
            .consolidation_pass(round, season, tenants, manage_phase)
            .await;

        if let Err(e) = self.store.end_consolidation().await {
            warn!(error = %e, "Failed to release consolidation flag");
        }

        match pass {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(round, error = %e, "Consolidation pass failed");
                self.store.save(StatePatch::error_counted()).await.ok();
                if manage_phase {
                    self.store
                        .save(StatePatch::phase(RoundPhase::Failed))
                        .await
                        .ok();
                }
                Err(e)
            }
        }
    }

    /// Body of the pass, executed while holding the consolidation flag.
    async fn consolidation_pass(
        &self,
        round: u32,
        season: u16,
        tenants: &[Tenant],
        manage_phase: bool,
    ) -> Result<()> {
        // The entry check ran before the flag was held; a concurrent pass
        // may have finished this round in between its load and our acquire.
        // Re-check now that the flag serializes us against it.
        if self.store.load().await?.consolidated_rounds.contains(&round) {
            info!(round, "Round consolidated by a concurrent pass, skipping");
            self.store
                .append_event(
                    OrchestratorEvent::new(EventKind::ConsolidationSkipped)
                        .round(round)
                        .details("round consolidated by a concurrent pass"),
                )
                .await?;
            if manage_phase {
                self.set_phase(RoundPhase::Awaiting).await?;
            }
            return Ok(());
        }

        self.store
            .append_event(
                OrchestratorEvent::new(EventKind::ConsolidationStarted)
                    .round(round)
                    .details(format!("{} tenants", tenants.len())),
            )
            .await?;

        if manage_phase {
            self.set_phase(RoundPhase::Finalizing).await?;
        }

        let mut failures = 0usize;
        failures += self
            .run_hook_for_all(Hook::MarketOpen, round, season, tenants, false)
            .await?;
        failures += self
            .run_hook_for_all(Hook::RoundFinalize, round, season, tenants, false)
            .await?;

        if manage_phase {
            self.set_phase(RoundPhase::Consolidating).await?;
        }
        failures += self
            .run_hook_for_all(Hook::Consolidate, round, season, tenants, false)
            .await?;

        if failures == 0 {
            if self.store.mark_round_consolidated(round).await? {
                info!(round, "Round consolidated");
            }
            self.store
                .append_event(
                    OrchestratorEvent::new(EventKind::ConsolidationCompleted)
                        .round(round)
                        .details(format!("{} tenants", tenants.len())),
                )
                .await?;
        } else {
            // Not recorded as consolidated: a forced or resumed pass can
            // redo the round once the failing modules are fixed.
            warn!(round, failures, "Consolidation finished with hook failures");
            self.store
                .append_event(
                    OrchestratorEvent::new(EventKind::ConsolidationCompleted)
                        .round(round)
                        .details(format!("{failures} hook failures; round not marked")),
                )
                .await?;
        }

        if manage_phase {
            self.set_phase(RoundPhase::Completed).await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Hook execution
    // ------------------------------------------------------------------

    /// Run `hook` for every tenant and every active manager, in registry
    /// order. Returns the number of failed invocations.
    async fn run_hook_for_all(
        &self,
        hook: Hook,
        round: u32,
        season: u16,
        tenants: &[Tenant],
        collectors_only: bool,
    ) -> Result<usize> {
        let phase = self.store.load().await?.phase;
        let mut failures = 0usize;

        for tenant in tenants {
            let ctx = HookContext {
                round_number: round,
                season,
                phase,
                tenant,
            };
            for manager in self.registry.active_for(tenant) {
                if collectors_only && !manager.descriptor().collects_data {
                    continue;
                }
                if !self.run_hook(manager.as_ref(), hook, &ctx).await {
                    failures += 1;
                }
            }
        }
        Ok(failures)
    }

    /// Run one hook inside the isolating boundary. Returns success.
    async fn run_hook(&self, manager: &dyn Manager, hook: Hook, ctx: &HookContext<'_>) -> bool {
        let id = manager.descriptor().id.clone();
        let running = match hook {
            Hook::LiveUpdate => ManagerRunStatus::Collecting,
            Hook::Consolidate => ManagerRunStatus::Consolidating,
            _ => ManagerRunStatus::Processing,
        };
        // Status persistence must never interrupt the flow.
        if let Err(e) = self
            .store
            .upsert_manager_status(&id, ManagerStatusPatch::running(running))
            .await
        {
            debug!(manager = %id, error = %e, "Failed to persist running status");
        }

        let started = std::time::Instant::now();
        let outcome = timeout(self.hook_timeout, manager.run_hook(hook, ctx)).await;
        let elapsed_ms = started.elapsed().as_millis();

        match outcome {
            Ok(Ok(report)) => {
                debug!(
                    manager = %id,
                    hook = hook.name(),
                    tenant = %ctx.tenant.id,
                    elapsed_ms,
                    "Hook completed"
                );
                if let Err(e) = self
                    .store
                    .upsert_manager_status(&id, ManagerStatusPatch::done(report.items_collected))
                    .await
                {
                    debug!(manager = %id, error = %e, "Failed to persist done status");
                }
                true
            }
            Ok(Err(hook_error)) => {
                warn!(
                    manager = %id,
                    hook = hook.name(),
                    tenant = %ctx.tenant.id,
                    error = %hook_error,
                    "Hook failed"
                );
                self.record_hook_failure(
                    &id,
                    ctx,
                    EventKind::HookFailed,
                    format!("{} {} for {}: {hook_error}", id, hook.name(), ctx.tenant.id),
                )
                .await;
                false
            }
            Err(_) => {
                let message = format!(
                    "{} {} for {}: timed out after {}ms",
                    id,
                    hook.name(),
                    ctx.tenant.id,
                    self.hook_timeout.as_millis()
                );
                warn!(manager = %id, hook = hook.name(), tenant = %ctx.tenant.id, "Hook timed out");
                self.record_hook_failure(&id, ctx, EventKind::HookTimedOut, message)
                    .await;
                false
            }
        }
    }

    async fn record_hook_failure(
        &self,
        id: &str,
        ctx: &HookContext<'_>,
        kind: EventKind,
        message: String,
    ) {
        if let Err(e) = self
            .store
            .upsert_manager_status(id, ManagerStatusPatch::errored(message.clone()))
            .await
        {
            debug!(manager = %id, error = %e, "Failed to persist error status");
        }
        if let Err(e) = self
            .store
            .append_event(
                OrchestratorEvent::new(kind)
                    .round(ctx.round_number)
                    .details(message),
            )
            .await
        {
            debug!(manager = %id, error = %e, "Failed to record hook failure event");
        }
        if let Err(e) = self.store.save(StatePatch::error_counted()).await {
            debug!(manager = %id, error = %e, "Failed to count hook failure");
        }
    }

    // ------------------------------------------------------------------
    // Phase machine
    // ------------------------------------------------------------------

    /// Advance the persisted phase, refusing edges outside the state machine.
    async fn set_phase(&self, next: RoundPhase) -> Result<()> {
        let current = self.store.load().await?.phase;
        if current == next {
            return Ok(());
        }
        if !current.can_advance_to(next) {
            warn!(from = current.as_str(), to = next.as_str(), "Refusing invalid phase edge");
            return Ok(());
        }
        self.store.save(StatePatch::phase(next)).await?;
        self.store
            .append_event(
                OrchestratorEvent::new(EventKind::PhaseChanged)
                    .details(format!("{} -> {}", current.as_str(), next.as_str())),
            )
            .await
    }
}
