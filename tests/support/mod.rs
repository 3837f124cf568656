//! Shared wiring for orchestrator integration tests.

use std::sync::Arc;
use std::time::Duration;

use roundlord::adapter::{MemoryStateStore, StaticTenantDirectory};
use roundlord::application::dispatcher::LifecycleDispatcher;
use roundlord::application::registry::ManagerRegistry;
use roundlord::application::scheduler::PollingScheduler;
use roundlord::application::watcher::MarketWatcher;
use roundlord::domain::manager::ManagerDescriptor;
use roundlord::domain::tenant::Tenant;
use roundlord::port::feed::MarketFeed;
use roundlord::port::manager::Manager;
use roundlord::port::store::StateStore;
use roundlord::testkit::{call_log, tenant, CallLog, RecordingManager};

pub const HOOK_TIMEOUT: Duration = Duration::from_millis(200);

/// A fully wired orchestrator over the in-memory store.
pub struct Rig {
    pub store: Arc<dyn StateStore>,
    pub watcher: MarketWatcher,
    pub dispatcher: LifecycleDispatcher,
    pub log: CallLog,
}

impl Rig {
    /// One scheduler tick by hand: poll, then dispatch.
    pub async fn tick(&self) {
        let signal = self.watcher.poll().await;
        self.dispatcher
            .dispatch(signal)
            .await
            .expect("dispatch should not surface storage errors");
    }

    pub fn scheduler(self, interval: Duration) -> PollingScheduler {
        PollingScheduler::new(self.watcher, self.dispatcher, self.store, interval)
    }
}

/// Wire a rig from a feed and pre-built managers sharing `log`.
pub fn rig(
    feed: Arc<dyn MarketFeed>,
    managers: Vec<Arc<dyn Manager>>,
    tenants: Vec<Tenant>,
    log: CallLog,
) -> Rig {
    rig_with_store(feed, Arc::new(MemoryStateStore::new()), managers, tenants, log)
}

/// Same wiring over a caller-supplied store.
pub fn rig_with_store(
    feed: Arc<dyn MarketFeed>,
    store: Arc<dyn StateStore>,
    managers: Vec<Arc<dyn Manager>>,
    tenants: Vec<Tenant>,
    log: CallLog,
) -> Rig {
    let mut builder = ManagerRegistry::builder();
    for manager in managers {
        builder = builder.register(manager);
    }
    let registry = Arc::new(builder.build().expect("valid manager graph"));

    let directory = Arc::new(StaticTenantDirectory::new(tenants));

    let watcher = MarketWatcher::new(feed, store.clone());
    let dispatcher =
        LifecycleDispatcher::new(registry, store.clone(), directory, HOOK_TIMEOUT);

    Rig {
        store,
        watcher,
        dispatcher,
        log,
    }
}

/// The canonical three-manager roster: a collector, a ranking step that
/// depends on it and a financial step that depends on the ranking.
pub fn default_managers(log: &CallLog) -> Vec<Arc<dyn Manager>> {
    vec![
        Arc::new(
            RecordingManager::new(
                ManagerDescriptor::new("collector", "Collector")
                    .always_on()
                    .priority(10)
                    .collects_data(),
                log.clone(),
            )
            .collecting(7),
        ),
        Arc::new(RecordingManager::new(
            ManagerDescriptor::new("ranking", "Ranking")
                .always_on()
                .priority(20)
                .depends_on(["collector"]),
            log.clone(),
        )),
        Arc::new(RecordingManager::new(
            ManagerDescriptor::new("ledger", "Ledger")
                .always_on()
                .priority(30)
                .depends_on(["ranking"])
                .produces_financial_entries(),
            log.clone(),
        )),
    ]
}

pub fn default_rig(feed: Arc<dyn MarketFeed>) -> Rig {
    let log = call_log();
    let managers = default_managers(&log);
    rig(feed, managers, vec![tenant("league-1", &[])], log)
}
