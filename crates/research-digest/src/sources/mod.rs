//! Source fetchers: one per bibliographic source.
//!
//! Every fetcher implements [`SourceFetcher`]; the closed set of fetchers is
//! the [`Fetcher`] enum. Adding a source means adding a variant here and a
//! [`Source`] tag, never inspecting types at runtime.
//!
//! Fetchers convert every network, status or parse failure into a
//! [`FetchError`] at their boundary. Records missing a title are skipped.

mod arxiv;
mod pubmed;
mod rxiv;

pub use arxiv::{ArxivFetcher, build_search_query, parse_feed};
pub use pubmed::{PubmedFetcher, build_term, parse_pubmed_xml};
pub use rxiv::{RxivFetcher, parse_details};

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;

use crate::client::HttpClient;
use crate::config::Config;
use crate::error::FetchError;
use crate::models::{FetchRequest, Paper, Source};
use crate::settings::RxivServer;

/// Per-source inputs for one fetch, derived from the request snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceQuery {
    /// Configured keywords.
    pub keywords: Vec<String>,
    /// Lookback window in days.
    pub days_back: u32,
    /// Result cap for this source and search mode.
    pub result_limit: usize,
    /// Day the lookback window ends on.
    pub today: NaiveDate,
    /// Over-fetch factor applied by preprint fetchers.
    pub candidate_multiplier: usize,
    /// arXiv category restriction.
    pub arxiv_categories: Vec<String>,
    /// bioRxiv/medRxiv servers to list.
    pub rxiv_servers: Vec<RxivServer>,
}

impl SourceQuery {
    /// Build the query a source's fetcher receives for a request.
    #[must_use]
    pub fn new(request: &FetchRequest, source: Source, today: NaiveDate) -> Self {
        Self {
            keywords: request.keywords.clone(),
            days_back: request.days_back,
            result_limit: request.result_limit(source),
            today,
            candidate_multiplier: request.preprint_candidate_multiplier.max(1),
            arxiv_categories: request.arxiv_categories.clone(),
            rxiv_servers: request.rxiv_servers.clone(),
        }
    }

    /// First day inside the lookback window.
    #[must_use]
    pub fn cutoff(&self) -> NaiveDate {
        self.today - Duration::days(i64::from(self.days_back))
    }

    /// Candidate cap for preprint sources, which filter by keyword downstream.
    #[must_use]
    pub fn preprint_cap(&self) -> usize {
        self.result_limit.saturating_mul(self.candidate_multiplier)
    }
}

/// Capability shared by every source fetcher.
#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Source tag of the records this fetcher produces.
    fn source(&self) -> Source;

    /// Fetch normalized, unscored papers.
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<Paper>, FetchError>;
}

/// Closed set of fetchers.
#[derive(Debug, Clone)]
pub enum Fetcher {
    /// arXiv Atom API.
    Arxiv(ArxivFetcher),
    /// bioRxiv/medRxiv details API.
    Biorxiv(RxivFetcher),
    /// PubMed E-utilities.
    Pubmed(PubmedFetcher),
}

impl Fetcher {
    /// Build the fetcher for a source.
    #[must_use]
    pub fn for_source(source: Source, client: HttpClient, config: &Config) -> Self {
        match source {
            Source::Arxiv => Self::Arxiv(ArxivFetcher::new(client, config)),
            Source::Biorxiv => Self::Biorxiv(RxivFetcher::new(client, config)),
            Source::Pubmed => Self::Pubmed(PubmedFetcher::new(client, config)),
        }
    }

    /// One fetcher per source, in source priority order.
    #[must_use]
    pub fn all(client: &HttpClient, config: &Config) -> Vec<Self> {
        Source::ALL.into_iter().map(|s| Self::for_source(s, client.clone(), config)).collect()
    }
}

#[async_trait::async_trait]
impl SourceFetcher for Fetcher {
    fn source(&self) -> Source {
        match self {
            Self::Arxiv(f) => f.source(),
            Self::Biorxiv(f) => f.source(),
            Self::Pubmed(f) => f.source(),
        }
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<Paper>, FetchError> {
        match self {
            Self::Arxiv(f) => f.fetch(query).await,
            Self::Biorxiv(f) => f.fetch(query).await,
            Self::Pubmed(f) => f.fetch(query).await,
        }
    }
}

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid markup regex"));

/// Strip markup tags and collapse whitespace.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let stripped = if text.contains('<') { TAG_RE.replace_all(text, " ") } else { text.into() };
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip a trailing dot that PubMed appends to titles, collapse whitespace.
fn clean_title(title: &str) -> String {
    let cleaned = clean_text(title);
    match cleaned.strip_suffix('.') {
        Some(stripped) if !stripped.ends_with('.') => stripped.to_string(),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DataSources, SearchMode};
    use crate::settings::Settings;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Tau\n  PET <i>in vivo</i>  "), "Tau PET in vivo");
        assert_eq!(clean_text("<p>A</p><p>B</p>"), "A B");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_clean_title_strips_single_trailing_dot() {
        assert_eq!(clean_title("Amyloid imaging."), "Amyloid imaging");
        assert_eq!(clean_title("Wait for it..."), "Wait for it...");
    }

    #[test]
    fn test_source_query_window_and_caps() {
        let mut settings = Settings::default();
        settings.preprint_candidate_multiplier = 4;
        let request =
            FetchRequest::from_settings(&settings, DataSources::all(), SearchMode::Brief, 7);
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        let query = SourceQuery::new(&request, Source::Arxiv, today);
        assert_eq!(query.cutoff(), NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
        assert_eq!(query.result_limit, settings.source_limits.brief.arxiv);
        assert_eq!(query.preprint_cap(), settings.source_limits.brief.arxiv * 4);
    }

    #[test]
    fn test_fetcher_set_is_in_priority_order() {
        let config = Config::for_testing("http://127.0.0.1:1");
        let client = HttpClient::new(&config).unwrap();
        let sources: Vec<Source> = Fetcher::all(&client, &config).iter().map(Fetcher::source).collect();
        assert_eq!(sources, Source::ALL.to_vec());
    }
}
