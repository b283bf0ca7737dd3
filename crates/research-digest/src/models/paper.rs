//! Normalized paper record shared by every source.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Bibliographic source a paper was fetched from.
///
/// Declaration order is the deduplication priority: when two sources return
/// the same title, the one declared first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// arXiv preprints.
    Arxiv,
    /// bioRxiv and medRxiv preprints (one fetcher, one tag).
    Biorxiv,
    /// PubMed curated literature index.
    Pubmed,
}

impl Source {
    /// Every source, in deduplication priority order.
    pub const ALL: [Self; 3] = [Self::Arxiv, Self::Biorxiv, Self::Pubmed];

    /// Short machine tag (`arxiv`, `biorxiv`, `pubmed`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Arxiv => "arxiv",
            Self::Biorxiv => "biorxiv",
            Self::Pubmed => "pubmed",
        }
    }

    /// Human-readable name used in error strings and exports.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Arxiv => "arXiv",
            Self::Biorxiv => "bioRxiv/medRxiv",
            Self::Pubmed => "PubMed",
        }
    }

    /// Whether the source is a preprint archive without native full-text search.
    #[must_use]
    pub const fn is_preprint(self) -> bool {
        matches!(self, Self::Arxiv | Self::Biorxiv)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arxiv" => Ok(Self::Arxiv),
            "biorxiv" | "medrxiv" | "rxiv" => Ok(Self::Biorxiv),
            "pubmed" => Ok(Self::Pubmed),
            other => Err(format!("unknown data source '{other}' (expected arxiv, biorxiv, pubmed)")),
        }
    }
}

/// A research paper, normalized from any source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Paper title (never empty once a fetcher accepted the record).
    pub title: String,

    /// Author names, comma separated.
    #[serde(default)]
    pub authors: String,

    /// Abstract text (may be empty).
    #[serde(default)]
    pub r#abstract: String,

    /// Publication date as `YYYY-MM-DD` (may be empty when unknown).
    #[serde(default)]
    pub published: String,

    /// Landing page URL (may be empty).
    #[serde(default)]
    pub url: String,

    /// Source tag.
    pub source: Source,

    /// Journal title (empty for preprints).
    #[serde(default)]
    pub journal: String,

    /// Journal volume (empty for preprints).
    #[serde(default)]
    pub volume: String,

    /// Journal issue (empty for preprints).
    #[serde(default)]
    pub issue: String,

    /// Keyword score plus any journal boost.
    #[serde(default)]
    pub relevance_score: f64,

    /// Configured keywords found in title or abstract, in configuration order.
    #[serde(default)]
    pub matched_keywords: Vec<String>,

    /// Whether the venue is classified as high impact.
    #[serde(default)]
    pub is_high_impact: bool,
}

impl Paper {
    /// Create an unscored paper with only a source and title.
    #[must_use]
    pub fn new(source: Source, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            authors: String::new(),
            r#abstract: String::new(),
            published: String::new(),
            url: String::new(),
            source,
            journal: String::new(),
            volume: String::new(),
            issue: String::new(),
            relevance_score: 0.0,
            matched_keywords: Vec::new(),
            is_high_impact: false,
        }
    }

    /// Dedup identity: lower-cased title with whitespace collapsed.
    #[must_use]
    pub fn normalized_title(&self) -> String {
        normalize_title(&self.title)
    }

    /// Lower-cased `title + abstract` used for keyword matching.
    ///
    /// Typographic apostrophes are folded to `'` so "Alzheimer’s" matches
    /// a configured "Alzheimer's".
    #[must_use]
    pub fn search_text(&self) -> String {
        let mut text = String::with_capacity(self.title.len() + self.r#abstract.len() + 1);
        text.push_str(&self.title);
        text.push(' ');
        text.push_str(&self.r#abstract);
        text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
    }

    /// Parsed publication date, if the string is a valid `YYYY-MM-DD`.
    #[must_use]
    pub fn published_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.published, "%Y-%m-%d").ok()
    }

    /// Get the first author's name if available.
    #[must_use]
    pub fn first_author(&self) -> Option<&str> {
        self.authors.split(',').map(str::trim).find(|a| !a.is_empty())
    }

    /// Get the publication year if the date is known.
    #[must_use]
    pub fn year(&self) -> Option<&str> {
        self.published.get(..4).filter(|y| y.chars().all(|c| c.is_ascii_digit()))
    }

    /// Whether the paper carries journal metadata.
    #[must_use]
    pub fn has_journal(&self) -> bool {
        !self.journal.trim().is_empty()
    }
}

/// Lower-case a title and collapse all whitespace runs to single spaces.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join(" ")
}
