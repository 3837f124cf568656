//! The manager plugin contract.
//!
//! Each feature module implements [`Manager`] and overrides the lifecycle
//! hooks it cares about; unimplemented hooks are no-ops. The ranking and
//! financial computations behind the hooks are the modules' own business;
//! the orchestrator only sequences them.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::manager::ManagerDescriptor;
use crate::domain::phase::RoundPhase;
use crate::domain::tenant::Tenant;

/// Context passed explicitly on every hook call.
///
/// Managers hold no lifecycle state of their own; whatever they need to
/// decide is in here or in their own persistent storage.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    pub round_number: u32,
    pub season: u16,
    pub phase: RoundPhase,
    pub tenant: &'a Tenant,
}

/// What a hook reports back on success.
#[derive(Debug, Clone, Copy, Default)]
pub struct HookReport {
    /// Items fetched or processed during this run, surfaced on dashboards.
    pub items_collected: u64,
}

impl HookReport {
    #[must_use]
    pub fn collected(items_collected: u64) -> Self {
        Self { items_collected }
    }
}

/// A failed hook. Always isolated to the (manager, tenant) it came from.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct HookError(pub String);

impl From<String> for HookError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

pub type HookResult = std::result::Result<HookReport, HookError>;

/// The lifecycle hooks a dispatch can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    MarketOpen,
    MarketClose,
    LiveUpdate,
    RoundFinalize,
    Consolidate,
    PreSeason,
}

impl Hook {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::MarketOpen => "on_market_open",
            Self::MarketClose => "on_market_close",
            Self::LiveUpdate => "on_live_update",
            Self::RoundFinalize => "on_round_finalize",
            Self::Consolidate => "on_consolidate",
            Self::PreSeason => "on_pre_season",
        }
    }
}

/// One pluggable feature module.
#[async_trait]
pub trait Manager: Send + Sync {
    /// Static metadata: id, ordering, activation and capability flags.
    fn descriptor(&self) -> &ManagerDescriptor;

    /// Market reopened; the previous round is finished.
    async fn on_market_open(&self, _ctx: &HookContext<'_>) -> HookResult {
        Ok(HookReport::default())
    }

    /// Market closed; a new round began.
    async fn on_market_close(&self, _ctx: &HookContext<'_>) -> HookResult {
        Ok(HookReport::default())
    }

    /// Periodic update while the round is live.
    async fn on_live_update(&self, _ctx: &HookContext<'_>) -> HookResult {
        Ok(HookReport::default())
    }

    /// The round ended; compute results.
    async fn on_round_finalize(&self, _ctx: &HookContext<'_>) -> HookResult {
        Ok(HookReport::default())
    }

    /// Terminal, idempotent per-round step; financial entries happen here.
    async fn on_consolidate(&self, _ctx: &HookContext<'_>) -> HookResult {
        Ok(HookReport::default())
    }

    /// Season boundary; reset per-season state.
    async fn on_pre_season(&self, _ctx: &HookContext<'_>) -> HookResult {
        Ok(HookReport::default())
    }

    /// Dispatch one hook by kind.
    async fn run_hook(&self, hook: Hook, ctx: &HookContext<'_>) -> HookResult {
        match hook {
            Hook::MarketOpen => self.on_market_open(ctx).await,
            Hook::MarketClose => self.on_market_close(ctx).await,
            Hook::LiveUpdate => self.on_live_update(ctx).await,
            Hook::RoundFinalize => self.on_round_finalize(ctx).await,
            Hook::Consolidate => self.on_consolidate(ctx).await,
            Hook::PreSeason => self.on_pre_season(ctx).await,
        }
    }
}
