use thiserror::Error;

use crate::{header::HeaderError, sources::SourceError};

/// What went wrong while extracting one table's keys.
#[derive(Error, Debug)]
pub enum ExtractionErrorKind {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Decode(#[from] HeaderError),
    #[error("no line terminator within the first {limit} bytes")]
    HeaderTooLong { limit: usize },
    #[error("extraction was cancelled")]
    Cancelled,
    #[error("extraction task panicked: {0}")]
    Panicked(String),
}

/// An [`ExtractionErrorKind`] tagged with the table it happened to.
#[derive(Error, Debug)]
#[error("failed to extract keys for table '{table}'")]
pub struct ExtractionError {
    table: String,
    #[source]
    kind: ExtractionErrorKind,
}

impl ExtractionError {
    pub fn new(table: impl Into<String>, kind: impl Into<ExtractionErrorKind>) -> Self {
        Self {
            table: table.into(),
            kind: kind.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn kind(&self) -> &ExtractionErrorKind {
        &self.kind
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ExtractionErrorKind::Cancelled)
    }
}
