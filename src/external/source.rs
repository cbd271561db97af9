use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// A published video as reported by the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub bvid: String,
    pub title: String,
    /// Display name of the uploader
    pub author: String,
    /// Publish time, epoch seconds
    pub created: i64,
}

impl Video {
    pub fn url(&self) -> String {
        format!("https://www.bilibili.com/video/{}", self.bvid)
    }
}

/// Remote listing of an author's most recent uploads.
///
/// Implementations perform exactly one attempt per call; pacing and retries
/// belong to the caller.
#[async_trait]
pub trait VideoSource: Send + Sync {
    fn platform(&self) -> &'static str;

    /// Newest first, at most `page_size` items
    async fn list_recent(&self, mid: &str, page_size: u32) -> AppResult<Vec<Video>>;

    /// Drop per-run cached state such as signing keys
    async fn reset_session(&self) {}
}
