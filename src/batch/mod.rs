//! Runs one extraction per table concurrently and folds the outcomes together.
//!
//! The batch is all-or-nothing: the first failure to arrive, in completion order, is the
//! batch result. Outcomes that arrive after that are never looked at. What happens to
//! the tasks still in flight is decided by [`FailurePolicy`].

use std::{collections::HashMap, sync::Arc};

use strum_macros::Display;
use tokio::task::{Id as TaskId, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    extraction::{
        ExtractOptions, ExtractionError, ExtractionErrorKind, ExtractionOutcome, TableDescriptor,
        extract,
    },
    sources::SourceFactory,
};

pub type BatchResult = Result<Vec<TableDescriptor>, ExtractionError>;

/// A table name and where to read it from.
#[derive(Clone)]
pub struct BatchItem {
    name: String,
    factory: Arc<dyn SourceFactory>,
}

impl BatchItem {
    pub fn new(name: impl Into<String>, factory: impl SourceFactory + 'static) -> Self {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for BatchItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchItem")
            .field("name", &self.name)
            .field("source", &self.factory.describe())
            .finish()
    }
}

/// What happens to the remaining tasks once the batch has failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FailurePolicy {
    /// Leave them running; their outcomes are dropped.
    #[default]
    Detach,
    /// Signal them to stop and wait until each has terminated its source.
    Cancel,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    pub extract: ExtractOptions,
    pub on_failure: FailurePolicy,
}

/// Extracts every item concurrently. On success the descriptors are in input order.
///
/// Must be called from within a tokio runtime.
pub async fn run_batch(items: Vec<BatchItem>, options: &BatchOptions) -> BatchResult {
    let cancel = CancellationToken::new();
    let mut tasks: JoinSet<ExtractionOutcome> = JoinSet::new();
    let mut task_slots: HashMap<TaskId, (usize, String)> = HashMap::with_capacity(items.len());
    let total = items.len();

    for (index, item) in items.into_iter().enumerate() {
        let BatchItem { name, factory } = item;
        let extract_options = options.extract;
        let cancel = cancel.clone();
        let task_name = name.clone();

        let handle = tasks.spawn(async move {
            extract(&task_name, factory.as_ref(), &extract_options, &cancel).await
        });
        task_slots.insert(handle.id(), (index, name));
    }
    debug!(tables = total, policy = %options.on_failure, "batch started");

    let mut tables: Vec<Option<TableDescriptor>> = vec![None; total];

    while let Some(joined) = tasks.join_next_with_id().await {
        let (task_id, outcome) = match joined {
            Ok((task_id, outcome)) => (task_id, outcome),
            Err(err) => {
                let task_id = err.id();
                let name = task_slots
                    .get(&task_id)
                    .map(|(_, name)| name.clone())
                    .unwrap_or_default();
                (
                    task_id,
                    Err(ExtractionError::new(
                        name,
                        ExtractionErrorKind::Panicked(err.to_string()),
                    )),
                )
            }
        };

        match outcome {
            Ok(table) => {
                if let Some((index, _)) = task_slots.remove(&task_id) {
                    tables[index] = Some(table);
                }
            }
            Err(err) => {
                warn!(
                    table = err.table(),
                    error = %err.kind(),
                    pending = tasks.len(),
                    "extraction failed, failing batch"
                );
                settle_remaining(&mut tasks, &cancel, options.on_failure).await;
                return Err(err);
            }
        }
    }

    debug!(tables = total, "batch complete");
    Ok(tables.into_iter().flatten().collect())
}

async fn settle_remaining(
    tasks: &mut JoinSet<ExtractionOutcome>,
    cancel: &CancellationToken,
    policy: FailurePolicy,
) {
    match policy {
        FailurePolicy::Detach => tasks.detach_all(),
        FailurePolicy::Cancel => {
            cancel.cancel();
            // outcomes are dropped unread, late failures included
            while tasks.join_next().await.is_some() {}
        }
    }
}
