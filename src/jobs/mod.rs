//! Cron-driven repetition of the monitor pass for `watch` mode.

pub mod error;
pub mod scheduler;

pub use error::{JobError, JobResult};
pub use scheduler::{CheckRunner, JobScheduler, shutdown_signal};
