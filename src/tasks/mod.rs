//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the cache is alive.
//!
//! # Tasks
//! - Expiration sweep: removes expired cache entries at the configured interval

mod sweep;

pub use sweep::{spawn_sweep_task, SweepTask};
