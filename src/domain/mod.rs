//! Feed-agnostic domain types for the round-market orchestrator.

pub mod manager;
pub mod market;
pub mod phase;
pub mod state;
pub mod tenant;

pub use manager::ManagerDescriptor;
pub use market::{classify, MarketSnapshot, MarketStatus, Signal, Transition, TransitionEvent};
pub use phase::RoundPhase;
pub use state::{
    EventKind, ManagerRunStatus, ManagerState, OrchestratorEvent, OrchestratorState, StatePatch,
    EVENT_LOG_CAP, SINGLETON_KEY,
};
pub use tenant::{ModuleConfig, Tenant};
