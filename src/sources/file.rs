//! Byte sources backed by files on disk.

use async_trait::async_trait;
use bytes::Bytes;
use camino::{Utf8Path, Utf8PathBuf};
use futures::StreamExt;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use super::byte_source::{ByteSource, SourceError, SourceFactory};

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
/// The read buffer is allocated up front at the full chunk size.
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

pub struct FileSourceFactory {
    path: Utf8PathBuf,
    chunk_size: usize,
}

impl FileSourceFactory {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Clamped to `1..=MAX_CHUNK_SIZE`.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_CHUNK_SIZE);
        self
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

#[async_trait]
impl SourceFactory for FileSourceFactory {
    fn describe(&self) -> String {
        self.path.to_string()
    }

    async fn open(&self) -> Result<Box<dyn ByteSource>, SourceError> {
        let file = File::open(&self.path)
            .await
            .map_err(|source| SourceError::Open {
                path: self.path.clone(),
                source,
            })?;
        Ok(Box::new(FileSource {
            stream: Some(ReaderStream::with_capacity(file, self.chunk_size)),
        }))
    }
}

/// Streams a file in chunks of at most `chunk_size` bytes.
///
/// Terminating drops the stream, which closes the file handle.
pub struct FileSource {
    stream: Option<ReaderStream<File>>,
}

#[async_trait]
impl ByteSource for FileSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, SourceError> {
        let stream = self.stream.as_mut().ok_or(SourceError::Terminated)?;
        match stream.next().await {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(source)) => Err(SourceError::Read { source }),
            None => Ok(None),
        }
    }

    fn terminate(&mut self) -> Result<(), SourceError> {
        self.stream = None;
        Ok(())
    }
}
