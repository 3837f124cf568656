//! The static manager catalog.
//!
//! Declares every feature module this deployment knows about, with its
//! activation key, ordering dependencies and capability flags. The business
//! logic behind each module lives elsewhere; the catalog entries here run the
//! lifecycle with no-op hooks so the orchestrator's sequencing, persistence
//! and failure handling can be exercised and observed end to end.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::registry::ManagerRegistry;
use crate::domain::manager::ManagerDescriptor;
use crate::error::{Error, Result};
use crate::port::manager::Manager;

/// A catalog entry with default (no-op) hook implementations.
pub struct CatalogManager {
    descriptor: ManagerDescriptor,
}

impl CatalogManager {
    #[must_use]
    pub fn new(descriptor: ManagerDescriptor) -> Self {
        Self { descriptor }
    }
}

#[async_trait]
impl Manager for CatalogManager {
    fn descriptor(&self) -> &ManagerDescriptor {
        &self.descriptor
    }
}

/// Every module descriptor, core modules first.
///
/// The four always-on modules form the backbone every league gets; the rest
/// activate per tenant through their module keys.
#[must_use]
pub fn descriptors() -> Vec<ManagerDescriptor> {
    vec![
        // Core, always-on.
        ManagerDescriptor::new("round_data", "Round Data")
            .always_on()
            .priority(10)
            .collects_data(),
        ManagerDescriptor::new("aggregate_ranking", "Aggregate Ranking")
            .always_on()
            .priority(20)
            .depends_on(["round_data"]),
        ManagerDescriptor::new("financial_ledger", "Financial Ledger")
            .always_on()
            .priority(30)
            .depends_on(["round_data", "aggregate_ranking"])
            .produces_financial_entries(),
        ManagerDescriptor::new("hall_of_fame", "Hall of Fame")
            .always_on()
            .priority(40)
            .depends_on(["aggregate_ranking"]),
        // Optional, keyed by tenant configuration.
        ManagerDescriptor::new("top_scorer", "Top Scorer")
            .module_key("top_scorer")
            .priority(50)
            .depends_on(["round_data"])
            .collects_data(),
        ManagerDescriptor::new("golden_glove", "Golden Glove")
            .module_key("golden_glove")
            .priority(50)
            .depends_on(["round_data"])
            .collects_data(),
        ManagerDescriptor::new("captain_bonus", "Captain Bonus")
            .module_key("captain_bonus")
            .priority(55)
            .depends_on(["round_data"]),
        ManagerDescriptor::new("knockout_bracket", "Knockout Bracket")
            .module_key("knockout_bracket")
            .priority(60)
            .depends_on(["round_data"])
            .produces_financial_entries(),
        ManagerDescriptor::new("monthly_prize", "Monthly Prize")
            .module_key("monthly_prize")
            .priority(60)
            .depends_on(["aggregate_ranking"])
            .produces_financial_entries(),
        ManagerDescriptor::new("half_season_ranking", "Half-Season Ranking")
            .module_key("half_season_ranking")
            .priority(60)
            .depends_on(["aggregate_ranking"])
            .produces_financial_entries(),
        ManagerDescriptor::new("points_race", "Points Race")
            .module_key("points_race")
            .priority(65)
            .depends_on(["aggregate_ranking"]),
        ManagerDescriptor::new("head_to_head", "Head to Head")
            .module_key("head_to_head")
            .priority(65)
            .depends_on(["round_data"])
            .produces_financial_entries(),
        ManagerDescriptor::new("best_lineup", "Best Lineup")
            .module_key("best_lineup")
            .priority(70)
            .depends_on(["round_data"]),
        ManagerDescriptor::new("survivor_pool", "Survivor Pool")
            .module_key("survivor_pool")
            .priority(70)
            .depends_on(["aggregate_ranking"])
            .produces_financial_entries(),
        ManagerDescriptor::new("season_awards", "Season Awards")
            .module_key("season_awards")
            .priority(90)
            .depends_on(["aggregate_ranking", "hall_of_fame"]),
    ]
}

/// Build the registry from the full catalog.
pub fn default_registry() -> Result<ManagerRegistry> {
    let mut builder = ManagerRegistry::builder();
    for descriptor in descriptors() {
        builder = builder.register(Arc::new(CatalogManager::new(descriptor)) as Arc<dyn Manager>);
    }
    builder.build().map_err(Error::from)
}
