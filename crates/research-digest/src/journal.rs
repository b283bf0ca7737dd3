//! Journal quality classification and the high-impact score boost.
//!
//! Rules are checked in this order, first hit wins:
//! 1. exclusions (substring of the normalized name): never high impact
//! 2. exact matches (normalized equality)
//! 3. family matches (whole-word prefix, "nature" covers "nature medicine")
//! 4. specific journals (normalized equality against the curated list)

use serde::Serialize;

use crate::models::Paper;
use crate::settings::{JournalRules, JournalScoring};

/// Which rule classified a journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalMatch {
    /// Matched an exclusion; never boosted.
    Excluded,
    /// Whole-name match.
    Exact,
    /// Journal family prefix match.
    Family,
    /// Curated journal list match.
    Specific,
    /// No rule applies.
    Unmatched,
}

impl JournalMatch {
    /// Whether the rule marks the venue as high impact.
    #[must_use]
    pub const fn is_high_impact(self) -> bool {
        matches!(self, Self::Exact | Self::Family | Self::Specific)
    }
}

/// Normalize a journal name for rule matching.
///
/// Lower-cases, spells out `&`, drops `. , : ;`, collapses whitespace and
/// strips a leading "the".
#[must_use]
pub fn normalize_journal(name: &str) -> String {
    let lowered = name.to_lowercase().replace('&', " and ");
    let stripped: String = lowered.chars().filter(|c| !matches!(c, '.' | ',' | ':' | ';')).collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.strip_prefix("the ") {
        Some(rest) => rest.to_string(),
        None => collapsed,
    }
}

fn whole_word_prefix(journal: &str, prefix: &str) -> bool {
    journal == prefix || journal.strip_prefix(prefix).is_some_and(|rest| rest.starts_with(' '))
}

fn normalize_all(list: &[String]) -> Vec<String> {
    list.iter().map(|j| normalize_journal(j)).filter(|j| !j.is_empty()).collect()
}

/// Classifies venues and applies the journal boost.
#[derive(Debug, Clone)]
pub struct JournalClassifier {
    exact: Vec<String>,
    family: Vec<String>,
    specific: Vec<String>,
    exclusions: Vec<String>,
    scoring: JournalScoring,
}

impl JournalClassifier {
    /// Build a classifier from rules and the boost table.
    #[must_use]
    pub fn new(rules: &JournalRules, scoring: &JournalScoring) -> Self {
        Self {
            exact: normalize_all(&rules.exact_matches),
            family: normalize_all(&rules.family_matches),
            specific: normalize_all(&rules.specific_journals),
            exclusions: normalize_all(&rules.exclusions),
            scoring: scoring.clone(),
        }
    }

    /// Classify a journal title.
    #[must_use]
    pub fn classify(&self, journal: &str) -> JournalMatch {
        let name = normalize_journal(journal);
        if name.is_empty() {
            return JournalMatch::Unmatched;
        }
        if self.exclusions.iter().any(|e| name.contains(e.as_str())) {
            return JournalMatch::Excluded;
        }
        if self.exact.iter().any(|e| *e == name) {
            return JournalMatch::Exact;
        }
        if self.family.iter().any(|f| whole_word_prefix(&name, f)) {
            return JournalMatch::Family;
        }
        if self.specific.iter().any(|s| *s == name) {
            return JournalMatch::Specific;
        }
        JournalMatch::Unmatched
    }

    /// Set `is_high_impact` and add the bucketed boost to the score.
    pub fn apply(&self, paper: &mut Paper) -> JournalMatch {
        let verdict = self.classify(&paper.journal);
        paper.is_high_impact = verdict.is_high_impact();
        if paper.is_high_impact && self.scoring.enabled {
            paper.relevance_score += self.scoring.boosts.boost_for(paper.matched_keywords.len());
        }
        verdict
    }
}
