//! Retention engine: message filter, per-community purge executor and the
//! time-of-day scheduler that drives it.

pub mod error;
pub mod executor;
pub mod filter;
pub mod notify;
pub mod saved;
pub mod scheduler;

pub use error::PurgeError;
pub use executor::{PurgeExecutor, PurgeReport};
pub use scheduler::RetentionScheduler;
