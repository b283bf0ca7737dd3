//! Fetch request: enabled sources, search mode, and a settings snapshot.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Source;
use crate::error::{DigestError, DigestResult};
use crate::settings::{
    JournalRules, JournalScoring, KeywordPriorities, RxivServer, Settings, SourceLimitTable,
};

/// Named preset controlling per-source result caps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Smallest caps, fastest.
    #[default]
    Brief,
    /// Medium caps.
    Standard,
    /// Largest caps.
    Extended,
}

impl SearchMode {
    /// Lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Brief => "brief",
            Self::Standard => "standard",
            Self::Extended => "extended",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brief" => Ok(Self::Brief),
            "standard" => Ok(Self::Standard),
            "extended" => Ok(Self::Extended),
            other => Err(format!("unknown search mode '{other}' (expected brief, standard, extended)")),
        }
    }
}

/// Set of enabled sources, always iterated in deduplication priority order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSources(BTreeSet<Source>);

impl DataSources {
    /// Every source enabled.
    #[must_use]
    pub fn all() -> Self {
        Self(Source::ALL.into_iter().collect())
    }

    /// No source enabled.
    #[must_use]
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    /// Enable a source.
    #[must_use]
    pub fn with(mut self, source: Source) -> Self {
        self.0.insert(source);
        self
    }

    /// Whether a source is enabled.
    #[must_use]
    pub fn contains(&self, source: Source) -> bool {
        self.0.contains(&source)
    }

    /// Whether no source is enabled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of enabled sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Enabled sources in priority order.
    pub fn iter(&self) -> impl Iterator<Item = Source> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Source> for DataSources {
    fn from_iter<I: IntoIterator<Item = Source>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for DataSources {
    type Err = String;

    /// Parse `arxiv,biorxiv,pubmed` or `all`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }
        s.split(',').filter(|part| !part.trim().is_empty()).map(str::parse::<Source>).collect()
    }
}

/// Everything one fetch needs, snapshotted from [`Settings`] at request time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Enabled sources.
    pub data_sources: DataSources,
    /// Search mode selecting the per-source caps.
    pub search_mode: SearchMode,
    /// Lookback window in days.
    pub days_back: u32,
    /// Minimum distinct keyword matches.
    pub min_keyword_matches: usize,
    /// Must-have override keywords.
    pub must_have_keywords: Vec<String>,
    /// Keywords to match.
    pub keywords: Vec<String>,
    /// Keyword priority tiers.
    pub priorities: KeywordPriorities,
    /// Journal rules.
    pub journals: JournalRules,
    /// Journal boost table.
    pub journal_scoring: JournalScoring,
    /// Maximum papers returned.
    pub max_results_display: usize,
    /// Per-mode source caps.
    pub source_limits: SourceLimitTable,
    /// Preprint over-fetch factor.
    pub preprint_candidate_multiplier: usize,
    /// arXiv category restriction.
    pub arxiv_categories: Vec<String>,
    /// bioRxiv/medRxiv servers to list.
    pub rxiv_servers: Vec<RxivServer>,
}

impl FetchRequest {
    /// Snapshot settings into a request.
    #[must_use]
    pub fn from_settings(
        settings: &Settings,
        data_sources: DataSources,
        search_mode: SearchMode,
        days_back: u32,
    ) -> Self {
        Self {
            data_sources,
            search_mode,
            days_back,
            min_keyword_matches: settings.min_keyword_matches,
            must_have_keywords: settings.must_have_keywords.clone(),
            keywords: settings.keywords.clone(),
            priorities: settings.priorities.clone(),
            journals: settings.journals.clone(),
            journal_scoring: settings.journal_scoring.clone(),
            max_results_display: settings.max_results_display,
            source_limits: settings.source_limits,
            preprint_candidate_multiplier: settings.preprint_candidate_multiplier,
            arxiv_categories: settings.arxiv_categories.clone(),
            rxiv_servers: settings.rxiv_servers.clone(),
        }
    }

    /// Fail fast before any network call.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Configuration`] when no source is enabled, the
    /// keyword list is empty, or the lookback window is zero.
    pub fn validate(&self) -> DigestResult<()> {
        if self.data_sources.is_empty() {
            return Err(DigestError::configuration("no data source enabled"));
        }
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(DigestError::configuration("keyword list is empty"));
        }
        if self.days_back == 0 {
            return Err(DigestError::configuration("days_back must be at least 1"));
        }
        if self.data_sources.contains(Source::Biorxiv) && self.rxiv_servers.is_empty() {
            return Err(DigestError::configuration(
                "bioRxiv/medRxiv enabled but no rxiv server configured",
            ));
        }
        Ok(())
    }

    /// Result cap handed to a source's fetcher for this request's mode.
    #[must_use]
    pub fn result_limit(&self, source: Source) -> usize {
        self.source_limits.for_mode(self.search_mode).for_source(source)
    }

    /// Cache fingerprint: sources, mode, lookback and keyword snapshot.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use md5::{Digest, Md5};

        let mut hasher = Md5::new();
        for source in self.data_sources.iter() {
            hasher.update(source.as_str().as_bytes());
            hasher.update(b",");
        }
        hasher.update(b"|");
        hasher.update(self.search_mode.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(self.days_back.to_string().as_bytes());
        hasher.update(b"|");

        for keyword in &self.keywords {
            hasher.update(keyword.to_lowercase().as_bytes());
            hasher.update(b"&");
        }

        format!("{:x}", hasher.finalize())
    }
}
