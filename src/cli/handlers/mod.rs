//! Command handlers for CLI operations
//!
//! Each handler owns the merged settings and runs one subcommand.

pub mod check;
pub mod config;
pub mod watch;

pub use check::CheckCommandHandler;
pub use config::ConfigCommandHandler;
pub use watch::WatchCommandHandler;
