//! Roundlord - round-market orchestration for fantasy-sports leagues.
//!
//! Watches an external market-status feed, classifies state transitions
//! (round start, finish, reopen, season boundaries) and drives registered
//! feature managers through a fixed lifecycle with failure isolation,
//! idempotent consolidation and restart-safe persisted state.
//!
//! # Architecture
//!
//! Hexagonal: the application core speaks only to ports, adapters plug the
//! edges in.
//!
//! - [`domain`] - Market statuses, transition classification, the round phase
//!   machine, the persisted state record, tenants and manager metadata
//! - [`port`] - Trait seams: [`port::feed::MarketFeed`],
//!   [`port::store::StateStore`], [`port::manager::Manager`],
//!   [`port::tenant::TenantDirectory`]
//! - [`application`] - Watcher, lifecycle dispatcher, manager registry and
//!   the polling scheduler
//! - [`adapter`] - HTTP feed client, SQLite and in-memory stores, the static
//!   tenant directory
//! - [`catalog`] - The static roster of feature managers
//! - [`config`] - TOML configuration and logging setup
//! - [`cli`] - Command-line surface
//!
//! # Features
//!
//! - `testkit` - Scripted feeds and recording managers for integration tests

pub mod adapter;
pub mod application;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
