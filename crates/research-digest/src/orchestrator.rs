//! Concurrent fan-out over the enabled source fetchers.
//!
//! Each fetcher runs on its own task under a per-source timeout. A panic, a
//! timeout or a [`FetchError`] only affects that source's batch; the others
//! still come back. Batches are returned in source priority order no matter
//! which fetcher finished first.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use futures::StreamExt;

use crate::client::HttpClient;
use crate::config::Config;
use crate::error::FetchError;
use crate::models::{FetchRequest, Paper, Source};
use crate::sources::{Fetcher, SourceFetcher, SourceQuery};

/// Outcome of one source's fetch.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    /// Source the batch came from.
    pub source: Source,
    /// Normalized papers, or the failure that replaced them.
    pub outcome: Result<Vec<Paper>, FetchError>,
}

/// Every batch of one fetch, in source priority order.
#[derive(Debug, Clone, Default)]
pub struct RawCandidates {
    /// One batch per enabled source.
    pub batches: Vec<SourceBatch>,
}

impl RawCandidates {
    /// Assemble candidates, restoring source priority order.
    #[must_use]
    pub fn new(mut batches: Vec<SourceBatch>) -> Self {
        batches.sort_by_key(|b| b.source);
        Self { batches }
    }

    /// Total papers across successful sources.
    #[must_use]
    pub fn total(&self) -> usize {
        self.batches.iter().filter_map(|b| b.outcome.as_ref().ok()).map(Vec::len).sum()
    }

    /// Failures in source priority order.
    pub fn errors(&self) -> impl Iterator<Item = &FetchError> {
        self.batches.iter().filter_map(|b| b.outcome.as_ref().err())
    }
}

/// Runs enabled fetchers with bounded parallelism.
#[derive(Debug, Clone)]
pub struct FetchOrchestrator {
    fetchers: Vec<Fetcher>,
    max_workers: usize,
    source_timeout: Duration,
}

impl FetchOrchestrator {
    /// Build an orchestrator with one fetcher per source.
    #[must_use]
    pub fn new(client: &HttpClient, config: &Config) -> Self {
        Self {
            fetchers: Fetcher::all(client, config),
            max_workers: config.max_workers.max(1),
            source_timeout: config.source_timeout,
        }
    }

    /// Fetch every enabled source for a request.
    ///
    /// Never fails: per-source problems end up in the returned batches.
    pub async fn run(&self, request: &FetchRequest, today: NaiveDate) -> RawCandidates {
        let enabled: Vec<Fetcher> = self
            .fetchers
            .iter()
            .filter(|f| request.data_sources.contains(f.source()))
            .cloned()
            .collect();
        let workers = enabled.len().clamp(1, self.max_workers);
        let timeout = self.source_timeout;

        tracing::debug!(sources = enabled.len(), workers, "Dispatching source fetchers");

        let batches: Vec<SourceBatch> = futures::stream::iter(enabled.into_iter().map(|fetcher| {
            let query = SourceQuery::new(request, fetcher.source(), today);
            run_isolated(fetcher, query, timeout)
        }))
        .buffer_unordered(workers)
        .collect()
        .await;

        RawCandidates::new(batches)
    }
}

/// Run one fetcher on its own task so a panic stays contained.
async fn run_isolated(fetcher: Fetcher, query: SourceQuery, timeout: Duration) -> SourceBatch {
    let source = fetcher.source();
    let started = Instant::now();

    let handle =
        tokio::spawn(async move { tokio::time::timeout(timeout, fetcher.fetch(&query)).await });

    let outcome = match handle.await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(FetchError::new(source, format!("timed out after {timeout:?}"))),
        Err(join_err) => Err(FetchError::new(source, format!("task failed: {join_err}"))),
    };
    let elapsed = started.elapsed();

    match &outcome {
        Ok(papers) => tracing::info!(
            source = source.as_str(),
            count = papers.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Source fetched"
        ),
        Err(err) => tracing::warn!(
            source = source.as_str(),
            error = %err.message,
            elapsed_ms = elapsed.as_millis() as u64,
            "Source failed"
        ),
    }

    SourceBatch { source, outcome }
}
