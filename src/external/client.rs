use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::config::HttpConfig;
use crate::error::{AppError, AppResult};

/// Build the HTTP client shared by every remote call of a run.
///
/// - **Timeouts**: request and connect timeouts from `[http]`
/// - **Proxy**: every scheme routed through `http.proxy` when set
/// - **Compression**: gzip, deflate, brotli and zstd
/// - **Cookies**: a cookie store, seeded with `http.cookie` as a default header
///
/// No User-Agent is set here; the listing client picks one per request.
pub fn build_http_client(config: &HttpConfig) -> AppResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        // Timeouts
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        // Connection pooling
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        // HTTP/2 settings
        .http2_adaptive_window(true)
        // Enable compression (gzip, deflate, brotli, zstd)
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .zstd(true)
        .cookie_store(true);

    if let Some(proxy) = config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy.trim()).map_err(|e| AppError::Validation {
            field: "http.proxy".into(),
            reason: e.to_string(),
        })?;
        builder = builder.proxy(proxy);
    }

    if let Some(cookie) = config.cookie.as_deref().filter(|c| !c.trim().is_empty()) {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(cookie.trim()).map_err(|e| AppError::Validation {
            field: "http.cookie".into(),
            reason: e.to_string(),
        })?;
        headers.insert(header::COOKIE, value);
        builder = builder.default_headers(headers);
    }

    builder.build().map_err(|e| AppError::Internal {
        source: anyhow::Error::new(e).context("Failed to build HTTP client"),
    })
}
