//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! - [`ScriptedFeed`] — feed that replays a fixed script of snapshots and
//!   errors, repeating the last snapshot when exhausted.
//! - [`RecordingManager`] — manager that records every hook invocation and
//!   can be told to fail or stall.
//! - [`StaggeredFlagStore`] — store wrapper that stalls flag acquisition to
//!   widen race windows between concurrent consolidation passes.
//! - [`tenant`] — a canonical test tenant.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::adapter::MemoryStateStore;
use crate::domain::manager::ManagerDescriptor;
use crate::domain::market::{MarketSnapshot, MarketStatus};
use crate::domain::state::{OrchestratorEvent, OrchestratorState, StatePatch};
use crate::domain::tenant::Tenant;
use crate::error::{Error, Result};
use crate::port::feed::MarketFeed;
use crate::port::manager::{Hook, HookContext, HookReport, HookResult, Manager};
use crate::port::store::{ManagerStatusPatch, StateStore};

// ---------------------------------------------------------------------------
// ScriptedFeed
// ---------------------------------------------------------------------------

/// One scripted poll outcome.
pub enum FeedStep {
    Snapshot(MarketSnapshot),
    Failure(String),
}

/// A feed that pops one scripted step per fetch.
///
/// When the script runs out, the last successful snapshot is repeated, so a
/// scheduler under test can keep ticking without new scripting.
pub struct ScriptedFeed {
    steps: Mutex<VecDeque<FeedStep>>,
    last: Mutex<Option<MarketSnapshot>>,
}

impl ScriptedFeed {
    #[must_use]
    pub fn new(steps: Vec<FeedStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
        }
    }

    /// Script from (status, round) pairs in season 2025.
    #[must_use]
    pub fn from_statuses(script: &[(MarketStatus, u32)]) -> Self {
        Self::new(
            script
                .iter()
                .map(|&(status, round_number)| {
                    FeedStep::Snapshot(MarketSnapshot {
                        status,
                        round_number,
                        season: 2025,
                    })
                })
                .collect(),
        )
    }
}

#[async_trait]
impl MarketFeed for ScriptedFeed {
    async fn fetch_snapshot(&self) -> Result<MarketSnapshot> {
        match self.steps.lock().pop_front() {
            Some(FeedStep::Snapshot(snapshot)) => {
                *self.last.lock() = Some(snapshot);
                Ok(snapshot)
            }
            Some(FeedStep::Failure(message)) => Err(Error::Feed(message)),
            None => {
                (*self.last.lock()).ok_or_else(|| Error::Feed("scripted feed exhausted".into()))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingManager
// ---------------------------------------------------------------------------

/// One recorded hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookCall {
    pub manager_id: String,
    pub hook: Hook,
    pub tenant_id: String,
    pub round_number: u32,
}

/// Shared call log, so several managers can record into one ordered sequence.
pub type CallLog = Arc<Mutex<Vec<HookCall>>>;

#[must_use]
pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// A manager that records every hook call into a shared log.
///
/// Optionally fails a specific hook or stalls long enough to trip the
/// dispatcher's timeout.
pub struct RecordingManager {
    descriptor: ManagerDescriptor,
    log: CallLog,
    fail_on: Option<Hook>,
    delay: Option<Duration>,
    items: u64,
}

impl RecordingManager {
    #[must_use]
    pub fn new(descriptor: ManagerDescriptor, log: CallLog) -> Self {
        Self {
            descriptor,
            log,
            fail_on: None,
            delay: None,
            items: 0,
        }
    }

    /// Fail whenever `hook` is invoked.
    #[must_use]
    pub fn failing_on(mut self, hook: Hook) -> Self {
        self.fail_on = Some(hook);
        self
    }

    /// Sleep for `delay` inside every hook.
    #[must_use]
    pub fn delayed_by(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report `items` collected from every successful hook.
    #[must_use]
    pub fn collecting(mut self, items: u64) -> Self {
        self.items = items;
        self
    }

    async fn record(&self, hook: Hook, ctx: &HookContext<'_>) -> HookResult {
        self.log.lock().push(HookCall {
            manager_id: self.descriptor.id.clone(),
            hook,
            tenant_id: ctx.tenant.id.clone(),
            round_number: ctx.round_number,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on == Some(hook) {
            return Err(format!("{} scripted to fail", hook.name()).into());
        }
        Ok(HookReport::collected(self.items))
    }
}

#[async_trait]
impl Manager for RecordingManager {
    fn descriptor(&self) -> &ManagerDescriptor {
        &self.descriptor
    }

    async fn on_market_open(&self, ctx: &HookContext<'_>) -> HookResult {
        self.record(Hook::MarketOpen, ctx).await
    }

    async fn on_market_close(&self, ctx: &HookContext<'_>) -> HookResult {
        self.record(Hook::MarketClose, ctx).await
    }

    async fn on_live_update(&self, ctx: &HookContext<'_>) -> HookResult {
        self.record(Hook::LiveUpdate, ctx).await
    }

    async fn on_round_finalize(&self, ctx: &HookContext<'_>) -> HookResult {
        self.record(Hook::RoundFinalize, ctx).await
    }

    async fn on_consolidate(&self, ctx: &HookContext<'_>) -> HookResult {
        self.record(Hook::Consolidate, ctx).await
    }

    async fn on_pre_season(&self, ctx: &HookContext<'_>) -> HookResult {
        self.record(Hook::PreSeason, ctx).await
    }
}

// ---------------------------------------------------------------------------
// StaggeredFlagStore
// ---------------------------------------------------------------------------

/// An in-memory store that sleeps before each `try_begin_consolidation`.
///
/// Each call pops the next scripted delay (no delay once exhausted). Two
/// concurrent passes given different delays reproduce the cross-process
/// interleaving where one pass acquires the flag only after another has
/// already finished and released it.
pub struct StaggeredFlagStore {
    inner: MemoryStateStore,
    delays: Mutex<VecDeque<Duration>>,
}

impl StaggeredFlagStore {
    #[must_use]
    pub fn new(delays: Vec<Duration>) -> Self {
        Self {
            inner: MemoryStateStore::new(),
            delays: Mutex::new(delays.into()),
        }
    }
}

#[async_trait]
impl StateStore for StaggeredFlagStore {
    async fn load(&self) -> Result<OrchestratorState> {
        self.inner.load().await
    }

    async fn save(&self, patch: StatePatch) -> Result<()> {
        self.inner.save(patch).await
    }

    async fn append_event(&self, event: OrchestratorEvent) -> Result<()> {
        self.inner.append_event(event).await
    }

    async fn upsert_manager_status(&self, id: &str, patch: ManagerStatusPatch) -> Result<()> {
        self.inner.upsert_manager_status(id, patch).await
    }

    async fn try_begin_consolidation(&self) -> Result<bool> {
        let delay = self.delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.try_begin_consolidation().await
    }

    async fn end_consolidation(&self) -> Result<()> {
        self.inner.end_consolidation().await
    }

    async fn mark_round_consolidated(&self, round: u32) -> Result<bool> {
        self.inner.mark_round_consolidated(round).await
    }
}

// ---------------------------------------------------------------------------
// Tenants
// ---------------------------------------------------------------------------

/// A canonical active tenant with the given modules enabled.
#[must_use]
pub fn tenant(id: &str, enabled_modules: &[&str]) -> Tenant {
    let mut tenant = Tenant::new(id, format!("League {id}"));
    for module in enabled_modules {
        tenant.legacy_modules.insert((*module).to_string(), true);
    }
    tenant
}
