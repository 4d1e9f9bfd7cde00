//! Sync orchestration: bounded fan-out, per-entity sync runs and the continuous scheduler.

mod config;
mod continuous;
mod error;
mod syncer;
mod throttle;

#[cfg(test)]
mod testing;

pub const CRATE_NAME: &str = "hoopsync-sync";

pub use config::{SyncConfig, DEFAULT_BASE_URL, DEFAULT_DATABASE_URL};
pub use continuous::{Cadence, Continuous, ErrorSink, LogSink, NoopSink, RefreshAction};
pub use error::{AggregateError, SyncError};
pub use syncer::{SyncReport, Syncer, MAX_CONCURRENT_REQUESTS};
pub use throttle::{FanOutPolicy, ThrottleStats, Throttler};
