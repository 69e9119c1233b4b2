use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Failure raised by a [`ByteSource`] or its [`SourceFactory`].
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to open '{path}': {source}")]
    Open {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read chunk: {source}")]
    Read {
        #[source]
        source: io::Error,
    },
    /// A read was attempted after the source was terminated. Always a bug in the caller.
    #[error("source was read after it was terminated")]
    Terminated,
}

/// A lazy, finite supplier of byte chunks that can be stopped early.
///
/// Once [`terminate`](ByteSource::terminate) has been called the source must not deliver
/// any more chunks; `next_chunk` returns [`SourceError::Terminated`] instead.
#[async_trait]
pub trait ByteSource: Send {
    /// Returns the next chunk, or `None` once the data is exhausted.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, SourceError>;

    /// Releases the underlying resources. Calling it again is a no-op.
    fn terminate(&mut self) -> Result<(), SourceError>;
}

/// Opens a fresh [`ByteSource`] each time it is asked.
#[async_trait]
pub trait SourceFactory: Send + Sync {
    /// Human-readable location used in log lines.
    fn describe(&self) -> String;

    async fn open(&self) -> Result<Box<dyn ByteSource>, SourceError>;
}
