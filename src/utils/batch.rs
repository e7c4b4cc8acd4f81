//! Bounded-concurrency batch execution
//!
//! Items are split into batches of `batch_size`. Within a batch at most
//! `max_concurrency` items run at once. Each item reports its own result, so
//! one failure never aborts the rest of the batch.

use std::{future::Future, sync::Arc};

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::errors::{WalletError, WalletResult};

pub struct Batch<T> {
    pub items: Vec<T>,
    pub batch_size: usize,
}

impl<T> Batch<T> {
    pub fn new(batch_size: usize) -> Self {
        Self {
            items: Vec::new(),
            batch_size,
        }
    }

    pub fn add(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.batch_size
    }

    pub fn take(&mut self) -> Vec<T> {
        std::mem::take(&mut self.items)
    }
}

/// Success and failure counts for a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results<R>(results: &[WalletResult<R>]) -> Self {
        let failed = results.iter().filter(|r| r.is_err()).count();
        Self {
            succeeded: results.len() - failed,
            failed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchProcessor {
    batch_size: usize,
    semaphore: Arc<Semaphore>,
}

impl BatchProcessor {
    pub fn new(batch_size: usize, max_concurrency: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Run `task` over every item; results come back in input order
    pub async fn run<T, R, F, Fut>(&self, items: Vec<T>, task: F) -> Vec<WalletResult<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = WalletResult<R>> + Send + 'static,
    {
        let total = items.len();
        let mut results = Vec::with_capacity(total);
        let mut batch = Batch::new(self.batch_size);
        let mut pending = items.into_iter().peekable();

        while pending.peek().is_some() {
            while !batch.is_full() {
                match pending.next() {
                    Some(item) => batch.add(item),
                    None => break,
                }
            }

            let handles: Vec<_> = batch
                .take()
                .into_iter()
                .map(|item| {
                    let semaphore = self.semaphore.clone();
                    let task = task.clone();
                    tokio::spawn(async move {
                        let _permit = semaphore
                            .acquire_owned()
                            .await
                            .map_err(|e| WalletError::TransportError(e.to_string()))?;
                        task(item).await
                    })
                })
                .collect();

            for handle in handles {
                let result = handle
                    .await
                    .unwrap_or_else(|e| Err(WalletError::TransportError(format!("batch task failed: {e}"))));
                if let Err(e) = &result {
                    warn!(error = %e, "Batch item failed");
                }
                results.push(result);
            }
        }

        let summary = BatchSummary::from_results(&results);
        debug!(total, succeeded = summary.succeeded, failed = summary.failed, "Batch run complete");
        results
    }
}
