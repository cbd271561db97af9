//! Hand-written fakes shared by the monitor tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::external::{Video, VideoSource};
use crate::notifications::{NotificationMessage, NotificationProvider, NotificationResult};

#[derive(Debug, Clone)]
pub enum Listing {
    Videos(Vec<Video>),
    RateLimited,
    Malformed,
    Panic,
}

/// Source answering from a per-author table; unknown authors list nothing.
#[derive(Default)]
pub struct FakeSource {
    listings: Mutex<HashMap<String, Listing>>,
    calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn set(&self, uid: &str, listing: Listing) {
        self.listings
            .lock()
            .unwrap()
            .insert(uid.to_string(), listing);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoSource for FakeSource {
    fn platform(&self) -> &'static str {
        "fake"
    }

    async fn list_recent(&self, mid: &str, page_size: u32) -> AppResult<Vec<Video>> {
        self.calls.lock().unwrap().push(mid.to_string());
        let listing = self.listings.lock().unwrap().get(mid).cloned();

        match listing {
            None => Ok(Vec::new()),
            Some(Listing::Videos(videos)) => Ok(videos.into_iter().take(page_size as usize).collect()),
            Some(Listing::RateLimited) => Err(AppError::RateLimited {
                platform: "fake".into(),
                code: -412,
            }),
            Some(Listing::Malformed) => Err(AppError::MalformedResponse {
                platform: "fake".into(),
                message: "data.list.vlist missing".into(),
            }),
            Some(Listing::Panic) => panic!("listing for {mid} exploded"),
        }
    }
}

/// Provider keeping every message it was asked to deliver
#[derive(Default)]
pub struct RecordingProvider {
    pub fail: bool,
    sent: Mutex<Vec<NotificationMessage>>,
}

impl RecordingProvider {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<NotificationMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationProvider for RecordingProvider {
    async fn send(&self, message: &NotificationMessage) -> AppResult<NotificationResult> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail {
            return Err(AppError::Notification {
                provider: "recording".into(),
                message: "down".into(),
            });
        }
        Ok(NotificationResult {
            success: true,
            status_code: None,
            response: None,
            duration_ms: 0,
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

pub fn video(bvid: &str, created: i64) -> Video {
    Video {
        bvid: bvid.into(),
        title: format!("Title {bvid}"),
        author: "Tester".into(),
        created,
    }
}
