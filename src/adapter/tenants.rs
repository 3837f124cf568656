//! Tenant directory backed by the static configuration file.

use async_trait::async_trait;

use crate::domain::tenant::Tenant;
use crate::error::Result;
use crate::port::tenant::TenantDirectory;

/// Serves the tenants declared in the config file, filtered to active ones.
pub struct StaticTenantDirectory {
    tenants: Vec<Tenant>,
}

impl StaticTenantDirectory {
    #[must_use]
    pub fn new(tenants: Vec<Tenant>) -> Self {
        Self { tenants }
    }
}

#[async_trait]
impl TenantDirectory for StaticTenantDirectory {
    async fn active_tenants(&self) -> Result<Vec<Tenant>> {
        Ok(self
            .tenants
            .iter()
            .filter(|t| t.active)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn inactive_tenants_are_filtered_out() {
        let mut dormant = Tenant::new("l2", "Dormant League");
        dormant.active = false;
        let directory =
            StaticTenantDirectory::new(vec![Tenant::new("l1", "League One"), dormant]);

        let active = directory.active_tenants().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "l1");
    }
}
