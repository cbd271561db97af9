//! Durable record of every video already announced, per author.
//!
//! The ledger file maps author id to video id to `{title, created}`:
//!
//! ```json
//! {
//!   "9617619": {
//!     "BV1xx411c7mD": { "title": "...", "created": 1700000000 }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::external::Video;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenEntry {
    pub title: String,
    pub created: i64,
}

/// Author id to video id to entry. Entries are only ever added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenLedger {
    authors: BTreeMap<String, BTreeMap<String, SeenEntry>>,
}

impl SeenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, uid: &str, bvid: &str) -> bool {
        self.authors
            .get(uid)
            .is_some_and(|videos| videos.contains_key(bvid))
    }

    /// Record `video` under `uid`. Returns false, leaving the stored entry
    /// untouched, when the video was already known.
    pub fn record(&mut self, uid: &str, video: &Video) -> bool {
        let videos = self.authors.entry(uid.to_string()).or_default();
        if videos.contains_key(&video.bvid) {
            return false;
        }
        videos.insert(
            video.bvid.clone(),
            SeenEntry {
                title: video.title.clone(),
                created: video.created,
            },
        );
        true
    }

    pub fn entries(&self, uid: &str) -> Option<&BTreeMap<String, SeenEntry>> {
        self.authors.get(uid)
    }

    /// Number of recorded videos across all authors
    pub fn total_items(&self) -> usize {
        self.authors.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_items() == 0
    }
}

/// JSON file holding the [`SeenLedger`]
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the ledger; a missing or unreadable file yields an empty one.
    pub async fn load(&self) -> SeenLedger {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No ledger yet, starting empty");
                return SeenLedger::new();
            }
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to read ledger, starting empty");
                return SeenLedger::new();
            }
        };

        match serde_json::from_str::<SeenLedger>(&data) {
            Ok(ledger) => {
                tracing::debug!(
                    path = %self.path.display(),
                    items = ledger.total_items(),
                    "Loaded ledger"
                );
                ledger
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ledger is corrupt, starting empty");
                SeenLedger::new()
            }
        }
    }

    /// Write the ledger through a sibling temp file renamed over the target.
    pub async fn save(&self, ledger: &SeenLedger) -> AppResult<()> {
        self.write_atomic(ledger)
            .await
            .map_err(|source| AppError::Persistence {
                path: self.path.display().to_string(),
                source,
            })
    }

    async fn write_atomic(&self, ledger: &SeenLedger) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let data = serde_json::to_string_pretty(ledger).context("serializing ledger")?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        tokio::fs::write(&tmp_path, data)
            .await
            .with_context(|| format!("writing {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("renaming {} into place", tmp_path.display()))?;

        Ok(())
    }
}
