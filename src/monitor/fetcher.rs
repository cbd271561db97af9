//! Paced, bounded-retry access to a [`VideoSource`].

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::config::FetchConfig;
use crate::error::{AppError, AppResult};
use crate::external::{Video, VideoSource};

/// Wraps a source with the request pacing and retry policy.
///
/// - every attempt is preceded by `request_delay` plus a uniform jitter
/// - transport failures and rate-limit rejections are retried, `max_retries`
///   attempts in total, sleeping `retry_delay × attempt` between attempts
/// - a hard API error gives up immediately
///
/// Both exhaustion and hard errors yield `Ok(vec![])`; only a malformed
/// payload (or another non-retryable error) is returned as `Err`.
pub struct Fetcher {
    source: Arc<dyn VideoSource>,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(source: Arc<dyn VideoSource>, config: FetchConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &dyn VideoSource {
        self.source.as_ref()
    }

    pub async fn fetch(&self, mid: &str, page_size: u32) -> AppResult<Vec<Video>> {
        let max_attempts = self.config.max_retries.max(1);

        for attempt in 1..=max_attempts {
            pause(self.pre_request_delay()).await;

            match self.source.list_recent(mid, page_size).await {
                Ok(videos) => {
                    tracing::debug!(uid = mid, attempt, count = videos.len(), "Fetched uploads");
                    return Ok(videos);
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(uid = mid, attempt, max_attempts, error = %e, "Fetch attempt failed");
                    if attempt < max_attempts {
                        pause(self.config.retry_delay().mul_f64(f64::from(attempt))).await;
                    }
                }
                Err(e @ AppError::Api { .. }) => {
                    tracing::error!(uid = mid, error = %e, "Listing rejected, skipping author");
                    return Ok(Vec::new());
                }
                Err(e) => return Err(e),
            }
        }

        tracing::error!(uid = mid, attempts = max_attempts, "Giving up after repeated failures");
        Ok(Vec::new())
    }

    fn pre_request_delay(&self) -> Duration {
        let (min, max) = (self.config.jitter_min_secs, self.config.jitter_max_secs);
        let jitter = if max > min {
            rand::rng().random_range(min..max)
        } else {
            min
        };
        self.config.request_delay() + Duration::from_secs_f64(jitter.max(0.0))
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
