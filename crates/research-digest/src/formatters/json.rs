//! JSON output formatting.

use serde_json::{Value, json};

use crate::models::{FetchResult, Paper};

/// Compact paper representation: empty fields are left out.
#[must_use]
pub fn compact_paper(paper: &Paper) -> Value {
    let mut obj = json!({
        "title": paper.title,
        "source": paper.source,
        "score": round_score(paper.relevance_score),
        "matched": paper.matched_keywords,
    });

    if !paper.authors.is_empty() {
        obj["authors"] = json!(paper.authors);
    }

    if !paper.published.is_empty() {
        obj["published"] = json!(paper.published);
    }

    if paper.has_journal() {
        obj["journal"] = json!(paper.journal);
        if !paper.volume.is_empty() {
            obj["volume"] = json!(paper.volume);
        }
        if !paper.issue.is_empty() {
            obj["issue"] = json!(paper.issue);
        }
    }

    if paper.is_high_impact {
        obj["highImpact"] = json!(true);
    }

    if !paper.url.is_empty() {
        obj["url"] = json!(paper.url);
    }

    obj
}

/// Compact digest: counts, errors and compact papers.
#[must_use]
pub fn compact_result(result: &FetchResult) -> Value {
    let mut obj = json!({
        "totalBeforeFilter": result.total_before_filter,
        "totalAfterFilter": result.total_after_filter,
        "papers": result.papers.iter().map(compact_paper).collect::<Vec<_>>(),
    });

    if !result.errors.is_empty() {
        obj["errors"] = json!(result.errors);
    }

    if !result.must_have_keywords.is_empty() {
        obj["mustHave"] = json!(result.must_have_keywords);
    }

    obj
}

/// Scores rounded to two decimals, so `3.0000000000000004` prints as `3.0`.
fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    #[test]
    fn test_compact_paper() {
        let mut paper = Paper::new(Source::Pubmed, "Tau PET");
        paper.journal = "Brain".to_string();
        paper.relevance_score = 1.5 + 1.2 + 0.000_000_1;
        paper.matched_keywords = vec!["tau".into(), "PET".into()];

        let compact = compact_paper(&paper);

        assert_eq!(compact["title"], "Tau PET");
        assert_eq!(compact["source"], "pubmed");
        assert_eq!(compact["score"], 2.7);
        assert_eq!(compact["journal"], "Brain");
        assert_eq!(compact["matched"], json!(["tau", "PET"]));
        assert!(compact.get("volume").is_none());
        assert!(compact.get("url").is_none());
        assert!(compact.get("highImpact").is_none());
    }

    #[test]
    fn test_compact_result_omits_empty_errors() {
        let result = FetchResult::default();
        let compact = compact_result(&result);
        assert_eq!(compact["papers"], json!([]));
        assert!(compact.get("errors").is_none());
    }
}
