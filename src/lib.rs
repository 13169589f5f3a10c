//! Lesson Cache - bounded, persistent response cache
//!
//! Sits in front of expensive lesson-content generation: answers "have we
//! already generated this?" under entry-count and byte budgets, expires stale
//! results and survives restarts through snapshots.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStore, RequestDescriptor, SharedCache};
pub use config::{CacheConfig, Config};
pub use tasks::{spawn_sweep_task, SweepTask};
