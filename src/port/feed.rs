//! Inbound market-status feed port.

use async_trait::async_trait;

use crate::domain::market::MarketSnapshot;
use crate::error::Result;

/// Source of the current market snapshot.
///
/// A fetch failure is always transient from the orchestrator's point of view:
/// the watcher counts it and retries on the next tick.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<MarketSnapshot>;
}
