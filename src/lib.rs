//! bili-up-watch
//!
//! Polls Bilibili authors for newly published videos, remembers what has
//! already been announced, and pushes a notification for each new one.

use shadow_rs::shadow;
shadow!(build);

pub mod cli;
pub mod config;
pub mod error;
pub mod external;
pub mod jobs;
pub mod ledger;
pub mod logger;
pub mod monitor;
pub mod notifications;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
