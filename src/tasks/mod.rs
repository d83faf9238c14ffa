//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of the process.
//!
//! # Tasks
//! - Cache Sweep: Removes stale cache entries once per freshness window

mod sweep;

pub use sweep::spawn_sweep_task;
