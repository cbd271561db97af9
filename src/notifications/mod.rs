//! Notification delivery with pluggable providers.
//!
//! One provider is chosen at startup, in order of preference:
//! 1. the host automation platform, when its marker variable is set
//! 2. Bark push, when a device key is configured
//! 3. standard output

mod bark_provider;
mod host_provider;
mod provider;
mod stdout_provider;

pub use bark_provider::BarkProvider;
pub use host_provider::HostCommandProvider;
pub use provider::{NotificationMessage, NotificationProvider, NotificationResult};
pub use stdout_provider::StdoutProvider;

use std::path::Path;
use std::sync::Arc;

use crate::config::NotifyConfig;

/// Pick the provider for this process from settings and the environment.
pub fn select_provider(
    config: &NotifyConfig,
    client: &reqwest::Client,
) -> Arc<dyn NotificationProvider> {
    let marker = std::env::var(&config.host.marker_env).ok();
    select_provider_with_marker(config, client, marker.as_deref())
}

fn select_provider_with_marker(
    config: &NotifyConfig,
    client: &reqwest::Client,
    marker: Option<&str>,
) -> Arc<dyn NotificationProvider> {
    if config.host.enabled
        && let Some(root) = marker.filter(|m| !m.trim().is_empty())
    {
        return Arc::new(HostCommandProvider::from_config(&config.host, Path::new(root)));
    }

    if config.bark.is_configured() {
        return Arc::new(BarkProvider::new(client.clone(), config.bark.clone()));
    }

    Arc::new(StdoutProvider)
}
