//! Research settings: keywords, priority tiers, journal rules, limits.
//!
//! Settings are a JSON document owned by the caller. They are validated once
//! at load time and then copied into each
//! [`FetchRequest`](crate::models::FetchRequest), so a fetch never observes
//! a settings change halfway through.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::models::{SearchMode, Source};

/// Complete research settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Keywords to match against title and abstract.
    pub keywords: Vec<String>,

    /// High and medium priority keyword tiers.
    pub priorities: KeywordPriorities,

    /// Keywords that admit a paper even below `min_keyword_matches`.
    pub must_have_keywords: Vec<String>,

    /// Target journal rules.
    pub journals: JournalRules,

    /// Journal boost table.
    pub journal_scoring: JournalScoring,

    /// Minimum distinct keyword matches for a paper to survive.
    pub min_keyword_matches: usize,

    /// Maximum papers returned per fetch.
    pub max_results_display: usize,

    /// Per-mode, per-source result caps.
    pub source_limits: SourceLimitTable,

    /// Preprint fetchers retrieve `limit * multiplier` candidates.
    pub preprint_candidate_multiplier: usize,

    /// Restrict arXiv to these categories (empty = all).
    pub arxiv_categories: Vec<String>,

    /// Which preprint servers the bioRxiv/medRxiv fetcher lists.
    pub rxiv_servers: Vec<RxivServer>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            keywords: [
                "Alzheimer's disease",
                "amyloid",
                "tau",
                "PET",
                "MRI",
                "neuroimaging",
                "biomarker",
                "dementia",
            ]
            .map(String::from)
            .to_vec(),
            priorities: KeywordPriorities::default(),
            must_have_keywords: Vec::new(),
            journals: JournalRules::default(),
            journal_scoring: JournalScoring::default(),
            min_keyword_matches: 1,
            max_results_display: 100,
            source_limits: SourceLimitTable::default(),
            preprint_candidate_multiplier: 3,
            arxiv_categories: Vec::new(),
            rxiv_servers: vec![RxivServer::Biorxiv, RxivServer::Medrxiv],
        }
    }
}

impl Settings {
    /// Load and validate settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file is unreadable, not valid JSON, or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|source| SettingsError::Io { path: path.display().to_string(), source })?;
        Self::from_json(&raw)
    }

    /// Parse and validate settings from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns error on invalid JSON or failed validation.
    pub fn from_json(raw: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(raw)?;
        settings.validated()
    }

    /// Normalize and validate, returning the cleaned settings.
    ///
    /// # Errors
    ///
    /// Returns error if a numeric field is out of range.
    pub fn validated(mut self) -> Result<Self, SettingsError> {
        self.keywords = dedup_keywords(&self.keywords);
        self.must_have_keywords = dedup_keywords(&self.must_have_keywords);
        self.priorities = self.priorities.validated()?;
        self.journals = self.journals.cleaned();
        self.journal_scoring.boosts.validate()?;

        if self.max_results_display == 0 {
            return Err(SettingsError::invalid("max_results_display", "must be at least 1"));
        }
        if self.preprint_candidate_multiplier == 0 {
            return Err(SettingsError::invalid(
                "preprint_candidate_multiplier",
                "must be at least 1",
            ));
        }

        self.arxiv_categories = self
            .arxiv_categories
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        let mut seen = BTreeSet::new();
        self.rxiv_servers.retain(|s| seen.insert(*s));

        for must_have in &self.must_have_keywords {
            if !self.keywords.iter().any(|k| k.eq_ignore_ascii_case(must_have)) {
                tracing::warn!(
                    keyword = %must_have,
                    "Must-have keyword is not in the keyword list and can never match"
                );
            }
        }

        Ok(self)
    }

    /// Weight contributed by one matched keyword.
    #[must_use]
    pub fn keyword_weight(&self, keyword: &str) -> f64 {
        self.priorities.weight_of(keyword)
    }
}

/// Trim, drop empties, and remove case-insensitive duplicates (first wins).
fn dedup_keywords(keywords: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty() && seen.insert(k.to_lowercase()))
        .map(String::from)
        .collect()
}

/// High and medium priority tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordPriorities {
    /// High priority tier.
    pub high: PriorityTier,
    /// Medium priority tier.
    pub medium: PriorityTier,
}

impl Default for KeywordPriorities {
    fn default() -> Self {
        Self {
            high: PriorityTier::new(["alzheimer's disease", "amyloid", "tau"], 1.5),
            medium: PriorityTier::new(["pet", "neuroimaging"], 1.2),
        }
    }
}

impl KeywordPriorities {
    /// Weight for a keyword: high boost, medium boost, or 1.0.
    ///
    /// High wins if a keyword somehow sits in both tiers.
    #[must_use]
    pub fn weight_of(&self, keyword: &str) -> f64 {
        let key = keyword.trim().to_lowercase();
        if self.high.keywords.contains(&key) {
            self.high.boost
        } else if self.medium.keywords.contains(&key) {
            self.medium.boost
        } else {
            1.0
        }
    }

    fn validated(mut self) -> Result<Self, SettingsError> {
        self.high = self.high.validated("priorities.high")?;
        self.medium = self.medium.validated("priorities.medium")?;

        let overlap: Vec<String> =
            self.high.keywords.intersection(&self.medium.keywords).cloned().collect();
        for keyword in overlap {
            tracing::warn!(keyword = %keyword, "Keyword in both priority tiers, keeping high");
            self.medium.keywords.remove(&keyword);
        }

        Ok(self)
    }
}

/// One priority tier: a keyword set and the weight each match contributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityTier {
    /// Lower-cased keywords in this tier.
    pub keywords: BTreeSet<String>,
    /// Weight of each matched keyword in this tier.
    pub boost: f64,
}

impl Default for PriorityTier {
    fn default() -> Self {
        Self { keywords: BTreeSet::new(), boost: 1.0 }
    }
}

impl PriorityTier {
    /// Create a tier from keywords and a boost.
    #[must_use]
    pub fn new<I, S>(keywords: I, boost: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords.into_iter().map(|k| k.as_ref().trim().to_lowercase()).collect();
        Self { keywords, boost }
    }

    fn validated(self, field: &str) -> Result<Self, SettingsError> {
        check_boost(&format!("{field}.boost"), self.boost)?;
        Ok(Self::new(self.keywords.iter().filter(|k| !k.trim().is_empty()), self.boost))
    }
}

fn check_boost(field: &str, value: f64) -> Result<(), SettingsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SettingsError::invalid(field, format!("must be a non-negative number, got {value}")))
    }
}

/// Target journal match rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalRules {
    /// Whole-name matches.
    pub exact_matches: Vec<String>,
    /// Journal families matched as a whole-word prefix ("Nature" → "Nature Medicine").
    pub family_matches: Vec<String>,
    /// Curated list matched by full normalized name only.
    pub specific_journals: Vec<String>,
    /// Substrings that disqualify a journal regardless of other rules.
    #[serde(alias = "journal_exclusions")]
    pub exclusions: Vec<String>,
}

impl Default for JournalRules {
    fn default() -> Self {
        Self {
            exact_matches: [
                "Nature",
                "Science",
                "Cell",
                "The Lancet",
                "New England Journal of Medicine",
                "JAMA",
                "BMJ",
            ]
            .map(String::from)
            .to_vec(),
            family_matches: ["Nature", "Lancet", "JAMA"].map(String::from).to_vec(),
            specific_journals: [
                "Nature Medicine",
                "Nature Neuroscience",
                "Neuron",
                "Brain",
                "Annals of Neurology",
                "Alzheimer's & Dementia",
                "Molecular Psychiatry",
                "Journal of Nuclear Medicine",
                "European Journal of Nuclear Medicine and Molecular Imaging",
            ]
            .map(String::from)
            .to_vec(),
            exclusions: [
                "Scientific Reports",
                "Nature Communications",
                "Cell Reports",
                "Heliyon",
                "Cureus",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl JournalRules {
    fn cleaned(self) -> Self {
        let clean = |list: Vec<String>| -> Vec<String> {
            list.into_iter().map(|j| j.trim().to_string()).filter(|j| !j.is_empty()).collect()
        };
        Self {
            exact_matches: clean(self.exact_matches),
            family_matches: clean(self.family_matches),
            specific_journals: clean(self.specific_journals),
            exclusions: clean(self.exclusions),
        }
    }
}

/// Journal boost settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalScoring {
    /// Apply the boost to high-impact papers.
    pub enabled: bool,
    /// Boost per matched-keyword bucket.
    pub boosts: BoostTable,
}

impl Default for JournalScoring {
    fn default() -> Self {
        Self { enabled: true, boosts: BoostTable::default() }
    }
}

/// Journal boost by matched-keyword count, bucketed as 1, 2, 3, 4, 5 or more.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostTable {
    /// Boost for exactly one matched keyword.
    #[serde(rename = "1_keyword")]
    pub one: f64,
    /// Boost for two matched keywords.
    #[serde(rename = "2_keywords")]
    pub two: f64,
    /// Boost for three matched keywords.
    #[serde(rename = "3_keywords")]
    pub three: f64,
    /// Boost for four matched keywords.
    #[serde(rename = "4_keywords")]
    pub four: f64,
    /// Boost for five or more matched keywords.
    #[serde(rename = "5_or_more_keywords")]
    pub five_or_more: f64,
}

impl Default for BoostTable {
    fn default() -> Self {
        Self { one: 1.5, two: 2.5, three: 3.5, four: 4.5, five_or_more: 5.1 }
    }
}

impl BoostTable {
    /// Boost for a matched-keyword count. Zero matches get no boost.
    #[must_use]
    pub const fn boost_for(&self, matched: usize) -> f64 {
        match matched {
            0 => 0.0,
            1 => self.one,
            2 => self.two,
            3 => self.three,
            4 => self.four,
            _ => self.five_or_more,
        }
    }

    fn validate(&self) -> Result<(), SettingsError> {
        check_boost("journal_scoring.boosts.1_keyword", self.one)?;
        check_boost("journal_scoring.boosts.2_keywords", self.two)?;
        check_boost("journal_scoring.boosts.3_keywords", self.three)?;
        check_boost("journal_scoring.boosts.4_keywords", self.four)?;
        check_boost("journal_scoring.boosts.5_or_more_keywords", self.five_or_more)
    }
}

/// Result caps per search mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLimitTable {
    /// Brief mode caps.
    pub brief: SourceLimits,
    /// Standard mode caps.
    pub standard: SourceLimits,
    /// Extended mode caps.
    pub extended: SourceLimits,
}

impl Default for SourceLimitTable {
    fn default() -> Self {
        Self {
            brief: SourceLimits::default(),
            standard: SourceLimits { arxiv: 100, biorxiv: 100, pubmed: 250 },
            extended: SourceLimits { arxiv: 250, biorxiv: 250, pubmed: 500 },
        }
    }
}

impl SourceLimitTable {
    /// Caps for a search mode.
    #[must_use]
    pub const fn for_mode(&self, mode: SearchMode) -> &SourceLimits {
        match mode {
            SearchMode::Brief => &self.brief,
            SearchMode::Standard => &self.standard,
            SearchMode::Extended => &self.extended,
        }
    }
}

/// Result cap for each source within one mode.
///
/// Missing fields fall back to the brief-mode caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLimits {
    /// arXiv cap.
    pub arxiv: usize,
    /// bioRxiv/medRxiv cap.
    pub biorxiv: usize,
    /// PubMed cap.
    pub pubmed: usize,
}

impl Default for SourceLimits {
    fn default() -> Self {
        Self { arxiv: 50, biorxiv: 50, pubmed: 100 }
    }
}

impl SourceLimits {
    /// Cap for one source.
    #[must_use]
    pub const fn for_source(&self, source: Source) -> usize {
        match source {
            Source::Arxiv => self.arxiv,
            Source::Biorxiv => self.biorxiv,
            Source::Pubmed => self.pubmed,
        }
    }
}

/// Preprint server listed by the bioRxiv/medRxiv fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RxivServer {
    /// bioRxiv.
    Biorxiv,
    /// medRxiv.
    Medrxiv,
}

impl RxivServer {
    /// API path segment and site host prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Biorxiv => "biorxiv",
            Self::Medrxiv => "medrxiv",
        }
    }
}
