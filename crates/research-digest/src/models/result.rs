//! Ranked, deduplicated, filtered result of one fetch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Paper, Source};

/// Outcome of one fetch. Immutable once returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    /// Ranked papers, at most `max_results_display`.
    pub papers: Vec<Paper>,

    /// Normalized candidates from every source before keyword filtering.
    pub total_before_filter: usize,

    /// Unique papers surviving keyword filtering, before truncation.
    pub total_after_filter: usize,

    /// Per-source failures, `"<source>: <reason>"`, in source priority order.
    #[serde(default)]
    pub errors: Vec<String>,

    /// Echo of the must-have filter that was applied.
    #[serde(default)]
    pub must_have_keywords: Vec<String>,

    /// Normalized candidates contributed by each source that succeeded.
    #[serde(default)]
    pub candidates_per_source: BTreeMap<Source, usize>,
}

impl FetchResult {
    /// Whether no paper survived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    /// Whether at least one source failed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Papers classified as high impact.
    pub fn high_impact(&self) -> impl Iterator<Item = &Paper> {
        self.papers.iter().filter(|p| p.is_high_impact)
    }

    /// Papers dropped by keyword filtering (duplicates included).
    #[must_use]
    pub fn filtered_out(&self) -> usize {
        self.total_before_filter.saturating_sub(self.total_after_filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result() {
        let result = FetchResult::default();
        assert!(result.is_empty());
        assert!(!result.has_errors());
        assert_eq!(result.filtered_out(), 0);
    }

    #[test]
    fn test_result_json_shape() {
        let mut paper = Paper::new(Source::Pubmed, "Tau PET");
        paper.is_high_impact = true;
        let result = FetchResult {
            papers: vec![paper],
            total_before_filter: 10,
            total_after_filter: 4,
            errors: vec!["arXiv: timed out".to_string()],
            must_have_keywords: vec!["tau".to_string()],
            candidates_per_source: BTreeMap::from([(Source::Pubmed, 10)]),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["total_before_filter"], 10);
        assert_eq!(json["candidates_per_source"]["pubmed"], 10);
        assert_eq!(result.high_impact().count(), 1);
        assert_eq!(result.filtered_out(), 6);
    }
}
