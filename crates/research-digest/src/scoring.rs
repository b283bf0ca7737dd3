//! Keyword relevance scoring and filtering.

use crate::models::{FetchRequest, Paper};

/// One configured keyword, ready for matching.
#[derive(Debug, Clone)]
struct KeywordRule {
    /// Keyword as configured, reported in `matched_keywords`.
    keyword: String,
    /// Lower-cased, apostrophe-folded needle.
    needle: String,
    weight: f64,
}

/// Keywords found in a paper and the score they add up to.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMatch {
    /// Matched keywords in configuration order.
    pub matched: Vec<String>,
    /// Sum of matched keyword weights.
    pub score: f64,
}

/// Scores papers against a request's keyword snapshot.
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    rules: Vec<KeywordRule>,
    min_matches: usize,
    must_have: Vec<String>,
}

fn fold(text: &str) -> String {
    text.trim().to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

impl KeywordScorer {
    /// Build a scorer from a request snapshot.
    #[must_use]
    pub fn new(request: &FetchRequest) -> Self {
        let rules = request
            .keywords
            .iter()
            .filter(|k| !k.trim().is_empty())
            .map(|k| KeywordRule {
                keyword: k.trim().to_string(),
                needle: fold(k),
                weight: request.priorities.weight_of(k),
            })
            .collect();
        let must_have = request
            .must_have_keywords
            .iter()
            .map(|k| fold(k))
            .filter(|k| !k.is_empty())
            .collect();

        Self { rules, min_matches: request.min_keyword_matches, must_have }
    }

    /// Match every keyword against title and abstract.
    #[must_use]
    pub fn evaluate(&self, paper: &Paper) -> KeywordMatch {
        let text = paper.search_text();
        let mut matched = Vec::new();
        let mut score = 0.0;
        for rule in &self.rules {
            if text.contains(&rule.needle) {
                matched.push(rule.keyword.clone());
                score += rule.weight;
            }
        }
        KeywordMatch { matched, score }
    }

    /// Filtering policy: enough matches, or a must-have hit. Zero matches
    /// never pass.
    #[must_use]
    pub fn admits(&self, m: &KeywordMatch) -> bool {
        if m.matched.is_empty() {
            return false;
        }
        m.matched.len() >= self.min_matches || self.has_must_have(&m.matched)
    }

    fn has_must_have(&self, matched: &[String]) -> bool {
        !self.must_have.is_empty() && matched.iter().any(|k| self.must_have.contains(&fold(k)))
    }

    /// Score a paper, returning it only if it survives filtering.
    #[must_use]
    pub fn score(&self, mut paper: Paper) -> Option<Paper> {
        let m = self.evaluate(&paper);
        if !self.admits(&m) {
            return None;
        }
        paper.relevance_score = m.score;
        paper.matched_keywords = m.matched;
        Some(paper)
    }
}
