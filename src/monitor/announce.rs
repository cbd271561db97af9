//! Set-difference against the ledger and delivery of new-video messages.

use jiff::Timestamp;
use jiff::tz::TimeZone;

use crate::external::Video;
use crate::ledger::SeenLedger;
use crate::notifications::{NotificationMessage, NotificationProvider};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Counts for one author's announcement pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnnounceOutcome {
    pub new_items: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Publish time rendered in `tz`, falling back to the raw epoch value
pub fn format_publish_time(created: i64, tz: &TimeZone) -> String {
    match Timestamp::from_second(created) {
        Ok(ts) => ts.to_zoned(tz.clone()).strftime(TIME_FORMAT).to_string(),
        Err(_) => created.to_string(),
    }
}

/// Message for one new video; `author` is the display name of the batch.
pub fn build_message(author: &str, video: &Video, tz: &TimeZone) -> NotificationMessage {
    NotificationMessage::new(
        format!("{author} published a new video"),
        format!(
            "{}\n{}\nPublished: {}",
            video.title,
            video.url(),
            format_publish_time(video.created, tz)
        ),
    )
}

/// Notify for every video of `uid` absent from the ledger, in the given
/// order, recording each one even when delivery fails.
///
/// Every message is titled with the author name of the first (most recent)
/// video, so collaboration uploads still read as this author's.
pub async fn announce_new(
    uid: &str,
    videos: &[Video],
    ledger: &mut SeenLedger,
    provider: &dyn NotificationProvider,
    tz: &TimeZone,
) -> AnnounceOutcome {
    let mut outcome = AnnounceOutcome::default();
    let Some(author) = videos.first().map(|v| v.author.as_str()) else {
        return outcome;
    };

    for video in videos {
        if ledger.contains(uid, &video.bvid) {
            continue;
        }
        outcome.new_items += 1;
        tracing::info!(uid, bvid = %video.bvid, title = %video.title, "New video");

        match provider.send(&build_message(author, video, tz)).await {
            Ok(result) if result.success => outcome.sent += 1,
            Ok(result) => {
                outcome.failed += 1;
                tracing::error!(
                    uid,
                    bvid = %video.bvid,
                    provider = provider.name(),
                    status = ?result.status_code,
                    response = result.response.as_deref().unwrap_or_default(),
                    "Notification was not accepted"
                );
            }
            Err(e) => {
                outcome.failed += 1;
                tracing::error!(uid, bvid = %video.bvid, provider = provider.name(), error = %e, "Notification failed");
            }
        }

        ledger.record(uid, video);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::testing::{RecordingProvider, video};

    #[test]
    fn test_message_format() {
        let message = build_message("Tester", &video("BV1abc", 1700000000), &TimeZone::UTC);
        assert_eq!(message.title, "Tester published a new video");
        assert_eq!(
            message.body,
            "Title BV1abc\nhttps://www.bilibili.com/video/BV1abc\nPublished: 2023-11-14 22:13:20"
        );
    }

    #[test]
    fn test_publish_time_uses_zone() {
        let utc8 = TimeZone::fixed(jiff::tz::offset(8));
        assert_eq!(format_publish_time(1700000000, &utc8), "2023-11-15 06:13:20");
    }

    #[tokio::test]
    async fn test_only_unseen_videos_are_announced() {
        let mut ledger = SeenLedger::new();
        ledger.record("1", &video("A", 1));
        ledger.record("1", &video("B", 2));
        let provider = RecordingProvider::default();

        let fetched = [video("C", 3), video("B", 2), video("A", 1)];
        let outcome = announce_new("1", &fetched, &mut ledger, &provider, &TimeZone::UTC).await;

        assert_eq!(outcome, AnnounceOutcome { new_items: 1, sent: 1, failed: 0 });
        let sent = provider.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].body.starts_with("Title C\n"));

        let entry = &ledger.entries("1").unwrap()["C"];
        assert_eq!(entry.title, "Title C");
        assert_eq!(entry.created, 3);
        assert_eq!(ledger.total_items(), 3);
    }

    #[tokio::test]
    async fn test_batch_titled_with_first_listed_author() {
        let mut ledger = SeenLedger::new();
        let provider = RecordingProvider::default();

        let own = Video {
            author: "Uploader".into(),
            ..video("A", 20)
        };
        let collab = Video {
            author: "Collab Partner".into(),
            ..video("B", 10)
        };
        let outcome =
            announce_new("3", &[own, collab], &mut ledger, &provider, &TimeZone::UTC).await;

        assert_eq!(outcome.sent, 2);
        let titles: Vec<String> = provider.sent().into_iter().map(|m| m.title).collect();
        assert_eq!(
            titles,
            vec![
                "Uploader published a new video".to_string(),
                "Uploader published a new video".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_listing_announces_nothing() {
        let mut ledger = SeenLedger::new();
        let provider = RecordingProvider::default();
        let outcome = announce_new("3", &[], &mut ledger, &provider, &TimeZone::UTC).await;
        assert_eq!(outcome, AnnounceOutcome::default());
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_failed_dispatch_still_updates_ledger() {
        let mut ledger = SeenLedger::new();
        let provider = RecordingProvider::failing();

        let fetched = [video("X", 10), video("Y", 9)];
        let outcome = announce_new("7", &fetched, &mut ledger, &provider, &TimeZone::UTC).await;

        assert_eq!(outcome, AnnounceOutcome { new_items: 2, sent: 0, failed: 2 });
        assert!(ledger.contains("7", "X"));
        assert!(ledger.contains("7", "Y"));

        let again = announce_new("7", &fetched, &mut ledger, &provider, &TimeZone::UTC).await;
        assert_eq!(again, AnnounceOutcome::default());
    }
}
