//! Deduplication, ranking and truncation.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::Paper;

/// Ranked papers plus the survivor count before truncation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranked {
    /// At most `max_results_display` papers, best first.
    pub papers: Vec<Paper>,
    /// Unique survivors before truncation.
    pub total_after_filter: usize,
}

/// Drop later papers whose normalized title was already seen.
///
/// Input must already be in source priority order.
#[must_use]
pub fn dedup(papers: impl IntoIterator<Item = Paper>) -> Vec<Paper> {
    let mut seen = HashSet::new();
    papers.into_iter().filter(|p| seen.insert(p.normalized_title())).collect()
}

/// Score descending, then newer first.
#[must_use]
pub fn compare(a: &Paper, b: &Paper) -> Ordering {
    b.relevance_score.total_cmp(&a.relevance_score).then_with(|| b.published.cmp(&a.published))
}

/// Dedup, stable sort and truncate.
#[must_use]
pub fn rank(papers: impl IntoIterator<Item = Paper>, max_results_display: usize) -> Ranked {
    let mut papers = dedup(papers);
    let total_after_filter = papers.len();
    papers.sort_by(compare);
    papers.truncate(max_results_display);
    Ranked { papers, total_after_filter }
}
