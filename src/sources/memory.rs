//! Byte sources that serve chunks from memory.

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;

use super::byte_source::{ByteSource, SourceError, SourceFactory};

/// Hands out a [`MemorySource`] over the same chunks on every `open`.
#[derive(Clone, Debug, Default)]
pub struct MemorySourceFactory {
    label: String,
    chunks: Vec<Bytes>,
}

impl MemorySourceFactory {
    pub fn new(label: impl Into<String>, chunks: Vec<Bytes>) -> Self {
        Self {
            label: label.into(),
            chunks,
        }
    }

    /// A single chunk holding all of `data`.
    pub fn from_static(label: impl Into<String>, data: &'static [u8]) -> Self {
        Self::new(label, vec![Bytes::from_static(data)])
    }
}

#[async_trait]
impl SourceFactory for MemorySourceFactory {
    fn describe(&self) -> String {
        format!("memory:{}", self.label)
    }

    async fn open(&self) -> Result<Box<dyn ByteSource>, SourceError> {
        Ok(Box::new(MemorySource {
            chunks: self.chunks.iter().cloned().collect(),
            terminated: false,
        }))
    }
}

pub struct MemorySource {
    chunks: VecDeque<Bytes>,
    terminated: bool,
}

#[async_trait]
impl ByteSource for MemorySource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, SourceError> {
        if self.terminated {
            return Err(SourceError::Terminated);
        }
        Ok(self.chunks.pop_front())
    }

    fn terminate(&mut self) -> Result<(), SourceError> {
        self.terminated = true;
        self.chunks.clear();
        Ok(())
    }
}
