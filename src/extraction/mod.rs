//! One table: open its source, read the header line, name the result.

mod error;

pub use error::{ExtractionError, ExtractionErrorKind};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span};

use crate::{
    header::{DEFAULT_MAX_HEADER_BYTES, HeaderFormat, HeaderReader},
    sources::SourceFactory,
};

/// Name and column keys of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    name: String,
    keys: Vec<String>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>, keys: Vec<String>) -> Self {
        Self {
            name: name.into(),
            keys,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

pub type ExtractionOutcome = Result<TableDescriptor, ExtractionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub format: HeaderFormat,
    pub max_header_bytes: Option<usize>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            format: HeaderFormat::default(),
            max_header_bytes: Some(DEFAULT_MAX_HEADER_BYTES),
        }
    }
}

/// Opens one source from `factory` and reads its header into a [`TableDescriptor`].
///
/// Every failure comes back tagged with `name`. Exactly one source is opened and, if
/// the open succeeded, it is terminated exactly once before this returns.
pub async fn extract(
    name: &str,
    factory: &dyn SourceFactory,
    options: &ExtractOptions,
    cancel: &CancellationToken,
) -> ExtractionOutcome {
    let span = debug_span!("extract", table = name, source = %factory.describe());
    extract_inner(name, factory, options, cancel)
        .instrument(span)
        .await
}

async fn extract_inner(
    name: &str,
    factory: &dyn SourceFactory,
    options: &ExtractOptions,
    cancel: &CancellationToken,
) -> ExtractionOutcome {
    let source = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            return Err(ExtractionError::new(name, ExtractionErrorKind::Cancelled));
        }
        source = factory.open() => source.map_err(|e| ExtractionError::new(name, e))?,
    };

    let keys = HeaderReader::new(source, options.format)
        .with_max_header_bytes(options.max_header_bytes)
        .read(cancel)
        .await
        .map_err(|kind| ExtractionError::new(name, kind))?;

    debug!(keys = keys.len(), "extracted table keys");
    Ok(TableDescriptor::new(name, keys))
}
