//! Trait seams between the orchestrator core and its collaborators.

pub mod feed;
pub mod manager;
pub mod store;
pub mod tenant;

pub use feed::MarketFeed;
pub use manager::{Hook, HookContext, HookError, HookReport, HookResult, Manager};
pub use store::{ManagerStatusPatch, StateStore};
pub use tenant::TenantDirectory;
