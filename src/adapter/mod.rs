//! Edge adapters: the HTTP feed, the persistence backends, tenant sources.

pub mod feed;
pub mod store;
pub mod tenants;

pub use feed::HttpMarketFeed;
pub use store::memory::MemoryStateStore;
pub use store::sqlite::SqliteStateStore;
pub use tenants::StaticTenantDirectory;
