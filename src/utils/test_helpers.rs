pub use scripted::{ScriptedFactory, ScriptedSource, SourceCounters, Step};

pub mod scripted {
    use std::{
        collections::VecDeque,
        io,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::sources::{ByteSource, SourceError, SourceFactory};

    /// One scripted response to `next_chunk`.
    #[derive(Clone, Debug)]
    pub enum Step {
        Chunk(Bytes),
        Fail(String),
        /// Sleeps, then moves on to the next step.
        Delay(Duration),
        /// Fails and records the hit. Place it after the header to catch over-reads.
        Poison,
        /// Never resolves.
        Stall,
    }

    impl Step {
        pub fn chunk(data: &'static [u8]) -> Self {
            Step::Chunk(Bytes::from_static(data))
        }

        pub fn fail(message: impl Into<String>) -> Self {
            Step::Fail(message.into())
        }
    }

    /// Shared counters for everything a scripted source was asked to do.
    #[derive(Clone, Debug, Default)]
    pub struct SourceCounters {
        inner: Arc<Counts>,
    }

    #[derive(Debug, Default)]
    struct Counts {
        opens: AtomicUsize,
        reads: AtomicUsize,
        terminations: AtomicUsize,
        releases: AtomicUsize,
        poison_hits: AtomicUsize,
    }

    impl SourceCounters {
        pub fn opens(&self) -> usize {
            self.inner.opens.load(Ordering::SeqCst)
        }

        /// Calls to `next_chunk` made before termination.
        pub fn reads(&self) -> usize {
            self.inner.reads.load(Ordering::SeqCst)
        }

        /// Calls to `terminate`, repeated ones included.
        pub fn terminations(&self) -> usize {
            self.inner.terminations.load(Ordering::SeqCst)
        }

        /// Terminations that actually released something.
        pub fn releases(&self) -> usize {
            self.inner.releases.load(Ordering::SeqCst)
        }

        pub fn poison_hits(&self) -> usize {
            self.inner.poison_hits.load(Ordering::SeqCst)
        }
    }

    pub struct ScriptedSource {
        steps: VecDeque<Step>,
        counters: SourceCounters,
        terminated: bool,
        fail_terminate: bool,
    }

    impl ScriptedSource {
        pub fn new(steps: Vec<Step>, counters: SourceCounters) -> Self {
            Self {
                steps: steps.into(),
                counters,
                terminated: false,
                fail_terminate: false,
            }
        }

        /// Makes `terminate` report an error after releasing.
        pub fn failing_terminate(mut self) -> Self {
            self.fail_terminate = true;
            self
        }
    }

    #[async_trait]
    impl ByteSource for ScriptedSource {
        async fn next_chunk(&mut self) -> Result<Option<Bytes>, SourceError> {
            if self.terminated {
                return Err(SourceError::Terminated);
            }
            self.counters.inner.reads.fetch_add(1, Ordering::SeqCst);
            loop {
                match self.steps.pop_front() {
                    None => return Ok(None),
                    Some(Step::Chunk(chunk)) => return Ok(Some(chunk)),
                    Some(Step::Fail(message)) => {
                        return Err(SourceError::Read {
                            source: io::Error::other(message),
                        });
                    }
                    Some(Step::Delay(duration)) => tokio::time::sleep(duration).await,
                    Some(Step::Poison) => {
                        self.counters.inner.poison_hits.fetch_add(1, Ordering::SeqCst);
                        return Err(SourceError::Read {
                            source: io::Error::other("read past the header boundary"),
                        });
                    }
                    Some(Step::Stall) => std::future::pending::<()>().await,
                }
            }
        }

        fn terminate(&mut self) -> Result<(), SourceError> {
            self.counters.inner.terminations.fetch_add(1, Ordering::SeqCst);
            if !self.terminated {
                self.terminated = true;
                self.steps.clear();
                self.counters.inner.releases.fetch_add(1, Ordering::SeqCst);
                if self.fail_terminate {
                    return Err(SourceError::Read {
                        source: io::Error::other("close failed"),
                    });
                }
            }
            Ok(())
        }
    }

    /// Opens a fresh [`ScriptedSource`] over the same steps, all sharing one set of counters.
    #[derive(Clone, Debug, Default)]
    pub struct ScriptedFactory {
        steps: Vec<Step>,
        counters: SourceCounters,
        open_delay: Option<Duration>,
        open_error: Option<String>,
    }

    impl ScriptedFactory {
        pub fn new(steps: Vec<Step>) -> Self {
            Self {
                steps,
                ..Default::default()
            }
        }

        pub fn with_open_delay(mut self, delay: Duration) -> Self {
            self.open_delay = Some(delay);
            self
        }

        pub fn failing_open(mut self, message: impl Into<String>) -> Self {
            self.open_error = Some(message.into());
            self
        }

        pub fn counters(&self) -> SourceCounters {
            self.counters.clone()
        }
    }

    #[async_trait]
    impl SourceFactory for ScriptedFactory {
        fn describe(&self) -> String {
            "scripted".to_string()
        }

        async fn open(&self) -> Result<Box<dyn ByteSource>, SourceError> {
            if let Some(delay) = self.open_delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(message) = &self.open_error {
                return Err(SourceError::Open {
                    path: "scripted".into(),
                    source: io::Error::new(io::ErrorKind::NotFound, message.clone()),
                });
            }
            self.counters.inner.opens.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ScriptedSource::new(
                self.steps.clone(),
                self.counters.clone(),
            )))
        }
    }
}

pub mod file_helpers {
    use std::{fs, path::Path};

    use anyhow::Result;

    /// Writes `contents` to `dir/name` and returns the full path.
    pub fn write_csv(dir: &Path, name: &str, contents: &[u8]) -> Result<std::path::PathBuf> {
        let path = dir.join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }
}
