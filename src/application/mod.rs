//! The orchestrator core: registry, watcher, dispatcher, scheduler.

pub mod dispatcher;
pub mod registry;
pub mod scheduler;
pub mod watcher;

pub use dispatcher::LifecycleDispatcher;
pub use registry::{ManagerRegistry, ManagerRegistryBuilder};
pub use scheduler::PollingScheduler;
pub use watcher::MarketWatcher;
