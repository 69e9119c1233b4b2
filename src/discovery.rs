//! Finding the table exports in a directory.
//!
//! Only the top level of the directory is listed. A regular file counts as a table when
//! its file name matches the glob pattern; the table name is everything before the first
//! `.` of the file name.

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use glob::Pattern;
use tracing::{debug, warn};

use crate::{batch::BatchItem, sources::FileSourceFactory};

pub const DEFAULT_PATTERN: &str = "*.csv";

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub pattern: Pattern,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            pattern: Pattern::new(DEFAULT_PATTERN).unwrap_or_default(),
        }
    }
}

impl DiscoveryOptions {
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let pattern =
            Pattern::new(pattern).with_context(|| format!("Invalid file pattern '{pattern}'"))?;
        Ok(Self { pattern })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTable {
    pub name: String,
    pub path: Utf8PathBuf,
}

impl DiscoveredTable {
    pub fn into_batch_item(self, chunk_size: usize) -> BatchItem {
        BatchItem::new(
            self.name,
            FileSourceFactory::new(self.path).with_chunk_size(chunk_size),
        )
    }
}

/// Table name for a file name: the part before the first `.`.
pub fn table_name(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

/// Lists the tables in `dir`, sorted by file name.
pub async fn discover_tables(
    dir: &Utf8Path,
    options: &DiscoveryOptions,
) -> Result<Vec<DiscoveredTable>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read directory '{dir}'"))?;

    let mut tables = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Failed to list directory '{dir}'"))?
    {
        let path = match Utf8PathBuf::from_path_buf(entry.path()) {
            Ok(path) => path,
            Err(path) => {
                warn!(path = %path.display(), "skipping non UTF-8 path");
                continue;
            }
        };
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if !options.pattern.matches(file_name) {
            continue;
        }

        let name = table_name(file_name).to_string();
        if name.is_empty() {
            warn!(%path, "skipping file with empty table name");
            continue;
        }

        // follows symlinks, so a link to a regular file counts. An entry that cannot be
        // stat'ed (a dangling link) stays in, and its open fails under its table name.
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if !metadata.is_file() => {
                debug!(%path, "skipping non-file entry");
                continue;
            }
            Ok(_) => {}
            Err(e) => warn!(%path, error = %e, "could not stat table file"),
        }

        tables.push(DiscoveredTable { name, path });
    }

    tables.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(%dir, tables = tables.len(), "discovered tables");
    Ok(tables)
}

/// Rejects a directory argument that is not a directory before any work starts.
pub async fn ensure_directory(dir: &Utf8Path) -> Result<()> {
    let metadata = tokio::fs::metadata(dir)
        .await
        .with_context(|| format!("Directory not found: '{dir}'"))?;
    if metadata.is_dir() {
        Ok(())
    } else {
        Err(anyhow!("Not a directory: '{dir}'"))
    }
}
