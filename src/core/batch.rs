//! Bounded-concurrency fan-out
//!
//! Runs one async worker per item with at most `max_in_flight` outstanding.
//! A waiting item starts as soon as any running one finishes, and results
//! come back in input order. A failing or panicking worker only affects
//! its own slot.

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use serde::Serialize;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Recommended limit for geocoding fan-out
pub const DEFAULT_GEOCODE_CONCURRENCY: usize = 10;

/// Recommended limit for routing fan-out, routing calls are costlier
pub const DEFAULT_ROUTE_CONCURRENCY: usize = 5;

/// Per-item failure captured by the controller
#[derive(Debug, Error)]
pub enum BatchError<E> {
    #[error("worker failed: {0}")]
    Failed(E),

    #[error("worker panicked: {0}")]
    Panicked(String),
}

/// Concurrency limiter for a family of outbound calls
#[derive(Debug, Clone)]
pub struct BatchController {
    name: &'static str,
    max_in_flight: usize,
    dispatched: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
}

impl BatchController {
    /// A limit of zero is treated as one
    pub fn new(name: &'static str, max_in_flight: usize) -> Self {
        Self {
            name,
            max_in_flight: max_in_flight.max(1),
            dispatched: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Run `worker` over every item, preserving input order in the output
    pub async fn map_concurrently<T, R, E, F, Fut>(
        &self,
        items: Vec<T>,
        worker: F,
    ) -> Vec<(T, Result<R, BatchError<E>>)>
    where
        T: Clone,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: std::fmt::Display,
    {
        let total = items.len();
        tracing::debug!(
            "Batch {}: dispatching {} items ({} in flight max)",
            self.name,
            total,
            self.max_in_flight
        );

        let mut indexed: Vec<(usize, T, Result<R, BatchError<E>>)> =
            stream::iter(items.into_iter().enumerate())
                .map(|(index, item)| {
                    self.dispatched.fetch_add(1, Ordering::Relaxed);
                    let call = AssertUnwindSafe(worker(item.clone())).catch_unwind();
                    async move {
                        let outcome = match call.await {
                            Ok(Ok(value)) => Ok(value),
                            Ok(Err(e)) => Err(BatchError::Failed(e)),
                            Err(panic) => Err(BatchError::Panicked(panic_message(panic.as_ref()))),
                        };
                        (index, item, outcome)
                    }
                })
                .buffer_unordered(self.max_in_flight)
                .collect()
                .await;

        // completion order -> input order
        indexed.sort_unstable_by_key(|(index, _, _)| *index);
        let results: Vec<(T, Result<R, BatchError<E>>)> = indexed
            .into_iter()
            .map(|(_, item, outcome)| (item, outcome))
            .collect();

        let failures = results.iter().filter(|(_, r)| r.is_err()).count();
        if failures > 0 {
            self.failed.fetch_add(failures as u64, Ordering::Relaxed);
            tracing::warn!("Batch {}: {} of {} items failed", self.name, failures, total);
        }

        results
    }

    /// Get current statistics
    pub fn stats(&self) -> BatchStats {
        BatchStats {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Lifetime counters for a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub dispatched: u64,
    pub failed: u64,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
