//! The poll, dedupe, notify and persist loop.

mod announce;
mod fetcher;
#[cfg(test)]
pub(crate) mod testing;

pub use announce::{AnnounceOutcome, announce_new, build_message, format_publish_time};
pub use fetcher::Fetcher;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use jiff::tz::TimeZone;
use serde::Serialize;

use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::external::{BilibiliClient, VideoSource, build_http_client};
use crate::ledger::{LedgerStore, SeenLedger};
use crate::notifications::{NotificationProvider, select_provider};

/// Totals for one pass over every tracked author
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub authors_checked: usize,
    /// Authors with nothing listed, after retries or on a hard API error
    pub authors_skipped: usize,
    /// Authors whose processing returned an error or panicked
    pub authors_failed: usize,
    pub new_items: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
}

enum AuthorOutcome {
    Skipped,
    Processed(AnnounceOutcome),
}

pub struct Monitor {
    fetcher: Fetcher,
    provider: Arc<dyn NotificationProvider>,
    store: LedgerStore,
    uids: Vec<String>,
    page_size: u32,
    time_zone: TimeZone,
}

impl Monitor {
    pub fn new(
        fetcher: Fetcher,
        provider: Arc<dyn NotificationProvider>,
        store: LedgerStore,
        uids: Vec<String>,
    ) -> Self {
        Self {
            fetcher,
            provider,
            store,
            uids,
            page_size: 5,
            time_zone: TimeZone::UTC,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_time_zone(mut self, time_zone: TimeZone) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Wire the Bilibili client, the selected notifier and the ledger file.
    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        let http = build_http_client(&settings.http)?;
        let source: Arc<dyn VideoSource> = Arc::new(BilibiliClient::new(
            http.clone(),
            settings.fetch.sign_requests,
        ));
        let provider = select_provider(&settings.notify, &http);
        let time_zone = resolve_time_zone(settings.monitor.timezone.as_deref())?;

        Ok(Self::new(
            Fetcher::new(source, settings.fetch.clone()),
            provider,
            LedgerStore::new(settings.monitor.ledger_path()),
            settings.monitor.tracked_uids(),
        )
        .with_page_size(settings.monitor.page_size)
        .with_time_zone(time_zone))
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Ask the selected notifier whether its settings can work at all
    pub async fn validate_notifier(&self) -> AppResult<()> {
        self.provider.validate_config().await.inspect_err(|e| {
            tracing::error!(provider = self.provider.name(), error = %e, "Notifier is misconfigured");
        })
    }

    pub fn uids(&self) -> &[String] {
        &self.uids
    }

    /// One pass over every tracked author.
    ///
    /// Never fails: each author's errors and panics are logged and counted,
    /// and the ledger is saved after every author that listed anything.
    #[tracing::instrument(name = "check_updates", skip_all, fields(authors = self.uids.len()))]
    pub async fn check_updates(&self) -> CheckReport {
        self.fetcher.source().reset_session().await;
        let mut ledger = self.store.load().await;
        let mut report = CheckReport::default();

        for uid in self.uids.iter().map(|uid| uid.trim()) {
            if uid.is_empty() {
                continue;
            }
            report.authors_checked += 1;

            let result = AssertUnwindSafe(self.process_author(uid, &mut ledger))
                .catch_unwind()
                .await;

            match result {
                Ok(Ok(AuthorOutcome::Skipped)) => report.authors_skipped += 1,
                Ok(Ok(AuthorOutcome::Processed(outcome))) => {
                    report.new_items += outcome.new_items;
                    report.notifications_sent += outcome.sent;
                    report.notifications_failed += outcome.failed;
                }
                Ok(Err(e)) => {
                    report.authors_failed += 1;
                    tracing::error!(uid, error = %e, "Failed to process author");
                }
                Err(panic) => {
                    report.authors_failed += 1;
                    tracing::error!(uid, panic = %panic_message(panic.as_ref()), "Author processing panicked");
                }
            }
        }

        tracing::info!(
            checked = report.authors_checked,
            skipped = report.authors_skipped,
            failed = report.authors_failed,
            new_items = report.new_items,
            sent = report.notifications_sent,
            "Check finished"
        );
        report
    }

    async fn process_author(&self, uid: &str, ledger: &mut SeenLedger) -> AppResult<AuthorOutcome> {
        let videos = self.fetcher.fetch(uid, self.page_size).await?;
        let Some(latest) = videos.first() else {
            tracing::info!(uid, "Nothing listed, skipping author");
            return Ok(AuthorOutcome::Skipped);
        };
        tracing::info!(uid, author = %latest.author, listed = videos.len(), "Checking author");

        let outcome = announce_new(
            uid,
            &videos,
            ledger,
            self.provider.as_ref(),
            &self.time_zone,
        )
        .await;

        if let Err(e) = self.store.save(ledger).await {
            tracing::error!(uid, error = %e, "Failed to save ledger");
        }

        Ok(AuthorOutcome::Processed(outcome))
    }
}

/// Configured IANA zone, or the system zone when unset
pub fn resolve_time_zone(name: Option<&str>) -> AppResult<TimeZone> {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => TimeZone::get(name).map_err(|e| AppError::Validation {
            field: "monitor.timezone".into(),
            reason: e.to_string(),
        }),
        None => Ok(TimeZone::system()),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
