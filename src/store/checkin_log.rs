//! Append-only wellness check-in log

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{RecordStore, write_atomic};
use crate::slots::CheckInEntry;
use crate::{Error, Result};

/// Ordered history of check-ins stored as one JSON array
///
/// Every save reads the whole log, appends, and rewrites it, so a save costs
/// O(n) in history size. Fine for one check-in a day.
#[derive(Debug)]
pub struct CheckInLog {
    path: PathBuf,
    /// Serializes read-append-rewrite cycles within this process
    write_lock: Mutex<()>,
}

impl CheckInLog {
    /// Create a log backed by `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Read every entry in insertion order
    ///
    /// A missing file is an empty history.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub async fn load_all(&self) -> Result<Vec<CheckInEntry>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::Store(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let entries = serde_json::from_str(&content)?;
        Ok(entries)
    }

    /// Most recent entry, if the log has any
    ///
    /// # Errors
    ///
    /// Returns error if the log cannot be read
    pub async fn latest(&self) -> Result<Option<CheckInEntry>> {
        Ok(self.load_all().await?.pop())
    }
}

#[async_trait]
impl RecordStore<CheckInEntry> for CheckInLog {
    async fn save(&self, record: &CheckInEntry) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load_all().await?;
        entries.push(record.clone());

        let data = serde_json::to_string_pretty(&entries)?;
        write_atomic(&self.path, data.as_bytes()).await?;

        tracing::info!(
            path = %self.path.display(),
            entries = entries.len(),
            "check-in saved"
        );
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
