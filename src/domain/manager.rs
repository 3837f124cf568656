//! Static manager metadata.

use serde::{Deserialize, Serialize};

/// Immutable descriptor for one registered manager module.
///
/// Created once at startup from the static catalog and never mutated.
/// Lifecycle state lives in the persisted record, not here: managers are
/// stateless with respect to the round lifecycle and receive phase/context
/// explicitly on every hook call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerDescriptor {
    /// Unique identifier, e.g. `"aggregate_ranking"`.
    pub id: String,
    /// Human-readable name for dashboards.
    pub display_name: String,
    /// Key in the tenant's module configuration. `None` means the module can
    /// only run as always-on.
    pub module_key: Option<String>,
    /// Runs for every tenant regardless of module configuration.
    pub always_on: bool,
    /// Ids of managers that must execute earlier in every dispatch.
    pub dependencies: Vec<String>,
    /// Tie-breaker within one topological rank; lower runs first.
    pub priority: u32,
    /// Collects external data during a live round (receives `on_live_update`).
    pub collects_data: bool,
    /// Writes financial ledger entries during consolidation.
    pub produces_financial_entries: bool,
}

impl ManagerDescriptor {
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            module_key: None,
            always_on: false,
            dependencies: Vec::new(),
            priority: 50,
            collects_data: false,
            produces_financial_entries: false,
        }
    }

    #[must_use]
    pub fn module_key(mut self, key: impl Into<String>) -> Self {
        self.module_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn always_on(mut self) -> Self {
        self.always_on = true;
        self
    }

    #[must_use]
    pub fn depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = ids.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn collects_data(mut self) -> Self {
        self.collects_data = true;
        self
    }

    #[must_use]
    pub fn produces_financial_entries(mut self) -> Self {
        self.produces_financial_entries = true;
        self
    }
}
