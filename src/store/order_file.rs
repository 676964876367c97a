//! Single-slot coffee order file

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{RecordStore, write_atomic};
use crate::slots::CoffeeOrder;
use crate::{Error, Result};

/// Keeps the most recently completed order, overwritten on every save
#[derive(Debug, Clone)]
pub struct OrderFile {
    path: PathBuf,
}

impl OrderFile {
    /// Create a store backed by `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the last saved order, if any
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub async fn load(&self) -> Result<Option<CoffeeOrder>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Store(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        let order = serde_json::from_str(&content)?;
        Ok(Some(order))
    }
}

#[async_trait]
impl RecordStore<CoffeeOrder> for OrderFile {
    async fn save(&self, record: &CoffeeOrder) -> Result<()> {
        let data = serde_json::to_string_pretty(record)?;
        write_atomic(&self.path, data.as_bytes()).await?;
        tracing::info!(path = %self.path.display(), "order saved");
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
