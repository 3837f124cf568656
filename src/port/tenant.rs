//! Tenant configuration source.

use async_trait::async_trait;

use crate::domain::tenant::Tenant;
use crate::error::Result;

/// Read-only lookup of the leagues this deployment orchestrates.
///
/// Consulted once per dispatch; the orchestrator never mutates tenants.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn active_tenants(&self) -> Result<Vec<Tenant>>;
}
