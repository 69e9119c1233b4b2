//! Drives a [`ByteSource`] just far enough to see the header line.
//!
//! The reader accumulates chunks and searches only the newly arrived bytes for the
//! terminator, so finding the header is linear in its length. As soon as the
//! first line is complete the source is terminated, even if it still holds data, and no
//! further chunk is requested. At natural end of data the whole buffer is taken as the
//! header line.
//!
//! The source is terminated exactly once on every path out of [`HeaderReader::read`]. A
//! failure while terminating is logged and never replaces the outcome of the read.

use bytes::{Bytes, BytesMut};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::parser::{HeaderFormat, HeaderScan, finish_header, scan_header_from};
use crate::{
    extraction::ExtractionErrorKind,
    sources::{ByteSource, SourceError},
};

/// Upper bound on the bytes buffered while looking for the first terminator.
pub const DEFAULT_MAX_HEADER_BYTES: usize = 1024 * 1024;

enum ReaderState {
    AwaitingMore,
    Found(Vec<String>),
    Failed(ExtractionErrorKind),
}

pub struct HeaderReader {
    source: Box<dyn ByteSource>,
    format: HeaderFormat,
    max_header_bytes: Option<usize>,
    buffer: BytesMut,
    /// Length of the buffered prefix already known to hold no terminator.
    scanned: usize,
    chunks_read: usize,
    exhausted: bool,
    terminated: bool,
}

impl HeaderReader {
    pub fn new(source: Box<dyn ByteSource>, format: HeaderFormat) -> Self {
        Self {
            source,
            format,
            max_header_bytes: Some(DEFAULT_MAX_HEADER_BYTES),
            buffer: BytesMut::new(),
            scanned: 0,
            chunks_read: 0,
            exhausted: false,
            terminated: false,
        }
    }

    /// `None` lets the buffer grow until a terminator or end of data.
    pub fn with_max_header_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_header_bytes = limit;
        self
    }

    /// Reads until the header line is known, then terminates the source.
    ///
    /// If `cancel` fires while waiting for a chunk, the source is terminated and
    /// [`ExtractionErrorKind::Cancelled`] is returned.
    pub async fn read(
        mut self,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, ExtractionErrorKind> {
        let mut state = ReaderState::AwaitingMore;
        loop {
            state = match state {
                ReaderState::AwaitingMore => self.step(cancel).await,
                ReaderState::Found(keys) => {
                    debug!(
                        chunks = self.chunks_read,
                        bytes = self.buffer.len(),
                        keys = keys.len(),
                        "header found"
                    );
                    self.terminate_source();
                    return Ok(keys);
                }
                ReaderState::Failed(kind) => {
                    self.terminate_source();
                    return Err(kind);
                }
            };
        }
    }

    async fn step(&mut self, cancel: &CancellationToken) -> ReaderState {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return ReaderState::Failed(ExtractionErrorKind::Cancelled),
            next = self.next_chunk() => next,
        };

        match next {
            Err(e) => ReaderState::Failed(e.into()),
            Ok(None) => {
                self.exhausted = true;
                match finish_header(&self.buffer, &self.format) {
                    Ok(keys) => ReaderState::Found(keys),
                    Err(e) => ReaderState::Failed(e.into()),
                }
            }
            Ok(Some(chunk)) => self.accept(&chunk),
        }
    }

    fn accept(&mut self, chunk: &[u8]) -> ReaderState {
        self.chunks_read += 1;
        self.buffer.extend_from_slice(chunk);
        trace!(
            chunk_len = chunk.len(),
            buffered = self.buffer.len(),
            "received chunk"
        );

        match scan_header_from(&self.buffer, self.scanned, &self.format) {
            Ok(HeaderScan::Found(keys)) => ReaderState::Found(keys),
            Ok(HeaderScan::Pending) => {
                self.scanned = self.buffer.len();
                self.check_limit()
            }
            Err(e) => ReaderState::Failed(e.into()),
        }
    }

    fn check_limit(&self) -> ReaderState {
        match self.max_header_bytes {
            Some(limit) if self.buffer.len() > limit => {
                ReaderState::Failed(ExtractionErrorKind::HeaderTooLong { limit })
            }
            _ => ReaderState::AwaitingMore,
        }
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>, SourceError> {
        // a finished source must never be polled again
        if self.terminated || self.exhausted {
            return Err(SourceError::Terminated);
        }
        self.source.next_chunk().await
    }

    fn terminate_source(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        if let Err(e) = self.source.terminate() {
            warn!(error = %e, "failed to terminate byte source");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_helpers::{ScriptedSource, SourceCounters, Step};

    fn keys(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    async fn read_steps(
        steps: Vec<Step>,
    ) -> (Result<Vec<String>, ExtractionErrorKind>, SourceCounters) {
        let counters = SourceCounters::default();
        let source = ScriptedSource::new(steps, counters.clone());
        let result = HeaderReader::new(Box::new(source), HeaderFormat::default())
            .read(&CancellationToken::new())
            .await;
        (result, counters)
    }

    #[tokio::test]
    async fn test_header_in_single_chunk() {
        let (result, counters) = read_steps(vec![Step::chunk(b"a,b,c\n1,2,3\n")]).await;
        assert_eq!(result.unwrap(), keys(&["a", "b", "c"]));
        assert_eq!(counters.reads(), 1);
        assert_eq!(counters.terminations(), 1);
    }

    #[tokio::test]
    async fn test_chunk_boundaries_do_not_matter() {
        let data: &[u8] = b"a,b,c\nrest";
        for split in 0..=data.len() {
            for second in split..=data.len() {
                let steps = vec![
                    Step::Chunk(Bytes::copy_from_slice(&data[..split])),
                    Step::Chunk(Bytes::copy_from_slice(&data[split..second])),
                    Step::Chunk(Bytes::copy_from_slice(&data[second..])),
                ];
                let (result, counters) = read_steps(steps).await;
                assert_eq!(
                    result.unwrap(),
                    keys(&["a", "b", "c"]),
                    "split at {split}/{second}"
                );
                assert_eq!(counters.terminations(), 1);
            }
        }
    }

    #[tokio::test]
    async fn test_byte_at_a_time() {
        let steps = b"id,name\n"
            .iter()
            .map(|b| Step::Chunk(Bytes::copy_from_slice(&[*b])))
            .chain([Step::Poison])
            .collect();
        let (result, counters) = read_steps(steps).await;
        assert_eq!(result.unwrap(), keys(&["id", "name"]));
        assert_eq!(counters.reads(), 8);
        assert_eq!(counters.poison_hits(), 0);
    }

    #[tokio::test]
    async fn test_long_header_one_byte_at_a_time() {
        const WIDTH: usize = 512 * 1024;
        let steps = std::iter::repeat_n(Step::chunk(b"k"), WIDTH)
            .chain([Step::chunk(b",z\n"), Step::Poison])
            .collect();
        let (result, counters) = read_steps(steps).await;

        let keys = result.unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].len(), WIDTH);
        assert_eq!(keys[1], "z");
        assert_eq!(counters.reads(), WIDTH + 1);
        assert_eq!(counters.poison_hits(), 0);
    }

    #[tokio::test]
    async fn test_no_trailing_newline() {
        let (result, counters) = read_steps(vec![Step::chunk(b"x,y")]).await;
        assert_eq!(result.unwrap(), keys(&["x", "y"]));
        // one chunk plus the end-of-data read
        assert_eq!(counters.reads(), 2);
        assert_eq!(counters.terminations(), 1);
    }

    #[tokio::test]
    async fn test_empty_chunk_then_end() {
        let (result, counters) = read_steps(vec![Step::chunk(b"")]).await;
        assert_eq!(result.unwrap(), keys(&[""]));
        assert_eq!(counters.terminations(), 1);
    }

    #[tokio::test]
    async fn test_immediate_end_of_data() {
        let (result, counters) = read_steps(vec![]).await;
        assert_eq!(result.unwrap(), keys(&[""]));
        assert_eq!(counters.reads(), 1);
        assert_eq!(counters.terminations(), 1);
    }

    #[tokio::test]
    async fn test_empty_first_line_with_data_after() {
        let (result, _) = read_steps(vec![Step::chunk(b"\nid,name\n1,a\n")]).await;
        assert_eq!(result.unwrap(), keys(&[""]));
    }

    #[tokio::test]
    async fn test_never_reads_past_header_boundary() {
        let steps = vec![
            Step::chunk(b"id,na"),
            Step::chunk(b"me\n1,alice\n2,bob\n"),
            Step::Poison,
            Step::chunk(b"3,carol\n"),
        ];
        let (result, counters) = read_steps(steps).await;
        assert_eq!(result.unwrap(), keys(&["id", "name"]));
        assert_eq!(counters.reads(), 2);
        assert_eq!(counters.poison_hits(), 0);
        assert_eq!(counters.terminations(), 1);
    }

    #[tokio::test]
    async fn test_read_error_still_terminates() {
        let (result, counters) =
            read_steps(vec![Step::chunk(b"id,"), Step::fail("disk on fire")]).await;
        match result.unwrap_err() {
            ExtractionErrorKind::Source(SourceError::Read { source }) => {
                assert_eq!(source.to_string(), "disk on fire")
            }
            other => panic!("expected read error, got {other:?}"),
        }
        assert_eq!(counters.terminations(), 1);
    }

    #[tokio::test]
    async fn test_terminate_failure_does_not_mask_read_error() {
        let counters = SourceCounters::default();
        let source = ScriptedSource::new(vec![Step::fail("bad sector")], counters.clone())
            .failing_terminate();
        let result = HeaderReader::new(Box::new(source), HeaderFormat::default())
            .read(&CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(ExtractionErrorKind::Source(SourceError::Read { .. }))
        ));
        assert_eq!(counters.terminations(), 1);
    }

    #[tokio::test]
    async fn test_terminate_failure_after_success_is_swallowed() {
        let counters = SourceCounters::default();
        let source =
            ScriptedSource::new(vec![Step::chunk(b"a\n")], counters.clone()).failing_terminate();
        let result = HeaderReader::new(Box::new(source), HeaderFormat::default())
            .read(&CancellationToken::new())
            .await;

        assert_eq!(result.unwrap(), keys(&["a"]));
        assert_eq!(counters.terminations(), 1);
    }

    #[tokio::test]
    async fn test_header_too_long() {
        let counters = SourceCounters::default();
        let source = ScriptedSource::new(
            vec![Step::chunk(b"aaaa"), Step::chunk(b"bbbb"), Step::Poison],
            counters.clone(),
        );
        let result = HeaderReader::new(Box::new(source), HeaderFormat::default())
            .with_max_header_bytes(Some(6))
            .read(&CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(ExtractionErrorKind::HeaderTooLong { limit: 6 })
        ));
        assert_eq!(counters.poison_hits(), 0);
        assert_eq!(counters.terminations(), 1);
    }

    #[tokio::test]
    async fn test_invalid_utf8_header() {
        let (result, counters) = read_steps(vec![Step::chunk(b"\xff,b\n")]).await;
        assert!(matches!(result, Err(ExtractionErrorKind::Decode(_))));
        assert_eq!(counters.terminations(), 1);
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_terminates_source() {
        let counters = SourceCounters::default();
        let source = ScriptedSource::new(vec![Step::chunk(b"id"), Step::Stall], counters.clone());
        let cancel = CancellationToken::new();

        let reader = HeaderReader::new(Box::new(source), HeaderFormat::default());
        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { reader.read(&cancel).await })
        };
        tokio::task::yield_now().await;
        cancel.cancel();

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(ExtractionErrorKind::Cancelled)));
        assert_eq!(counters.terminations(), 1);
    }
}
