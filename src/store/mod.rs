//! Durable storage for completed conversation records
//!
//! - [`OrderFile`] keeps only the latest coffee order, overwriting one file
//! - [`CheckInLog`] keeps every wellness check-in in a JSON array
//!
//! Both write through [`write_atomic`] so a crash mid-save leaves the previous
//! file intact.

mod checkin_log;
mod order_file;

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{Error, Result};

pub use checkin_log::CheckInLog;
pub use order_file::OrderFile;

/// Persistence for one kind of completed record
#[async_trait]
pub trait RecordStore<R>: Send + Sync {
    /// Persist a completed record
    ///
    /// Creates the backing file and its directory if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the record cannot be written
    async fn save(&self, record: &R) -> Result<()>;

    /// Location of the backing file
    fn location(&self) -> &Path;
}

/// Write `data` to `path` via a unique sibling temp file and rename
///
/// Concurrent writers to the same path each get their own temp file; the
/// last rename wins and readers never see a partial file.
///
/// # Errors
///
/// Returns [`Error::Store`] if the directory, temp file or rename fails
pub async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let path = path.to_path_buf();
    let data = data.to_vec();

    tokio::task::spawn_blocking(move || write_atomic_blocking(&path, &data))
        .await
        .map_err(|e| Error::Store(format!("write task failed: {e}")))?
}

fn write_atomic_blocking(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    std::fs::create_dir_all(&parent)
        .map_err(|e| Error::Store(format!("failed to create {}: {e}", parent.display())))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| {
        Error::Store(format!("failed to create temp file in {}: {e}", parent.display()))
    })?;
    if let Err(e) = tmp.write_all(data).and_then(|()| tmp.flush()) {
        return Err(Error::Store(format!(
            "failed to write temp file for {}: {e}",
            path.display()
        )));
    }
    tmp.persist(path)
        .map_err(|e| Error::Store(format!("failed to replace {}: {e}", path.display())))?;

    Ok(())
}
