//! Core entry points: `fetch` and `export`.
//!
//! [`DigestService`] owns the orchestrator and a handle to the shared
//! [`ResultCache`]. Everything after the network stage runs in
//! [`build_result`], a pure function of the request and the raw candidates.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};

use crate::aggregate;
use crate::cache::ResultCache;
use crate::client::HttpClient;
use crate::config::Config;
use crate::error::{DigestError, DigestResult};
use crate::journal::JournalClassifier;
use crate::models::{FetchRequest, FetchResult};
use crate::orchestrator::{FetchOrchestrator, RawCandidates};
use crate::scoring::KeywordScorer;

/// Fetch, score, rank and cache research papers.
#[derive(Debug, Clone)]
pub struct DigestService {
    orchestrator: FetchOrchestrator,
    cache: ResultCache,
}

impl DigestService {
    /// Create a service with its own result cache.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_cache(config, ResultCache::new())
    }

    /// Create a service writing to an existing cache.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn with_cache(config: &Config, cache: ResultCache) -> anyhow::Result<Self> {
        let client = HttpClient::new(config)?;
        Ok(Self { orchestrator: FetchOrchestrator::new(&client, config), cache })
    }

    /// The result cache this service writes to.
    #[must_use]
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Run one fetch with today's date as the end of the lookback window.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Configuration`] before any network call if the
    /// request is unusable, or [`DigestError::Internal`] if ranking breaks an
    /// invariant. Source failures are reported inside the result.
    pub async fn fetch(&self, request: &FetchRequest) -> DigestResult<Arc<FetchResult>> {
        self.fetch_as_of(request, Utc::now().date_naive()).await
    }

    /// Run one fetch with an explicit end date for the lookback window.
    ///
    /// # Errors
    ///
    /// See [`DigestService::fetch`].
    pub async fn fetch_as_of(
        &self,
        request: &FetchRequest,
        today: NaiveDate,
    ) -> DigestResult<Arc<FetchResult>> {
        request.validate()?;

        let started = Instant::now();
        tracing::info!(
            sources = ?request.data_sources.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            mode = %request.search_mode,
            days_back = request.days_back,
            "Fetch started"
        );

        let candidates = self.orchestrator.run(request, today).await;
        let result = build_result(request, candidates)?;

        tracing::info!(
            papers = result.papers.len(),
            total_before_filter = result.total_before_filter,
            total_after_filter = result.total_after_filter,
            errors = result.errors.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetch finished"
        );

        Ok(self.cache.store(request.fingerprint(), result).await)
    }

    /// The last fetch result, for export.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::NoCachedResult`] if no fetch has completed.
    pub async fn export(&self) -> DigestResult<Arc<FetchResult>> {
        self.cache.latest().await.map(|c| c.result).ok_or(DigestError::NoCachedResult)
    }
}

/// Score, classify, deduplicate and rank raw candidates.
///
/// # Errors
///
/// Returns [`DigestError::Internal`] if the assembled result violates a
/// ranking invariant.
pub fn build_result(request: &FetchRequest, candidates: RawCandidates) -> DigestResult<FetchResult> {
    let scorer = KeywordScorer::new(request);
    let classifier = JournalClassifier::new(&request.journals, &request.journal_scoring);

    let mut total_before_filter = 0;
    let mut errors = Vec::new();
    let mut candidates_per_source = BTreeMap::new();
    let mut survivors = Vec::new();

    for batch in candidates.batches {
        match batch.outcome {
            Ok(papers) => {
                total_before_filter += papers.len();
                candidates_per_source.insert(batch.source, papers.len());
                for paper in papers {
                    if let Some(mut paper) = scorer.score(paper) {
                        classifier.apply(&mut paper);
                        survivors.push(paper);
                    }
                }
            }
            Err(err) => errors.push(err.to_string()),
        }
    }

    let dropped = total_before_filter - survivors.len();
    tracing::debug!(dropped, survivors = survivors.len(), "Keyword filter applied");

    let ranked = aggregate::rank(survivors, request.max_results_display);
    let result = FetchResult {
        papers: ranked.papers,
        total_before_filter,
        total_after_filter: ranked.total_after_filter,
        errors,
        must_have_keywords: request.must_have_keywords.clone(),
        candidates_per_source,
    };

    check_invariants(request, &result)?;
    Ok(result)
}

/// Fail loudly on a mis-ranked result.
fn check_invariants(request: &FetchRequest, result: &FetchResult) -> DigestResult<()> {
    if result.total_after_filter > result.total_before_filter {
        return Err(DigestError::internal(format!(
            "total_after_filter {} exceeds total_before_filter {}",
            result.total_after_filter, result.total_before_filter
        )));
    }
    if result.papers.len() > result.total_after_filter
        || result.papers.len() > request.max_results_display
    {
        return Err(DigestError::internal("more papers returned than survived filtering"));
    }

    let mut titles = HashSet::new();
    for paper in &result.papers {
        if !paper.relevance_score.is_finite() {
            return Err(DigestError::internal(format!("non-finite score for '{}'", paper.title)));
        }
        if !titles.insert(paper.normalized_title()) {
            return Err(DigestError::internal(format!("duplicate title '{}'", paper.title)));
        }
    }
    if result.papers.windows(2).any(|w| w[0].relevance_score < w[1].relevance_score) {
        return Err(DigestError::internal("papers are not sorted by relevance"));
    }
    Ok(())
}
