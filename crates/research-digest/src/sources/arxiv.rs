//! arXiv fetcher over the Atom query API.

use chrono::NaiveDate;
use serde::Deserialize;

use super::{SourceFetcher, SourceQuery, clean_text, clean_title};
use crate::client::HttpClient;
use crate::config::Config;
use crate::error::{ClientError, ClientResult, FetchError};
use crate::models::{Paper, Source};

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    published: String,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel", default)]
    rel: String,
}

impl AtomEntry {
    /// arXiv reports query errors as a single entry under `/api/errors`.
    fn is_api_error(&self) -> bool {
        self.id.contains("/api/errors")
    }

    fn landing_url(&self) -> String {
        self.links
            .iter()
            .find(|l| l.rel == "alternate" && !l.href.is_empty())
            .map_or_else(|| self.id.trim().to_string(), |l| l.href.clone())
    }

    fn into_paper(self) -> Option<Paper> {
        let title = clean_title(&self.title);
        if title.is_empty() {
            tracing::debug!(id = %self.id, "Skipping arXiv entry without title");
            return None;
        }

        let mut paper = Paper::new(Source::Arxiv, title);
        paper.url = self.landing_url();
        paper.r#abstract = clean_text(&self.summary);
        paper.published = self.published.trim().get(..10).unwrap_or_default().to_string();
        paper.authors = self
            .authors
            .iter()
            .map(|a| clean_text(&a.name))
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        Some(paper)
    }
}

/// Parse an arXiv Atom feed into papers.
///
/// # Errors
///
/// Returns [`ClientError::Xml`] for malformed XML and
/// [`ClientError::BadRequest`] when arXiv answers with its error entry.
pub fn parse_feed(xml: &str) -> ClientResult<Vec<Paper>> {
    let feed: AtomFeed = quick_xml::de::from_str(xml)?;

    if let Some(err) = feed.entries.iter().find(|e| e.is_api_error()) {
        return Err(ClientError::bad_request(clean_text(&err.summary)));
    }

    Ok(feed.entries.into_iter().filter_map(AtomEntry::into_paper).collect())
}

/// Build the `search_query` parameter: quoted keywords OR-ed across all
/// fields, optionally restricted to categories.
#[must_use]
pub fn build_search_query(keywords: &[String], categories: &[String]) -> String {
    let terms: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().replace('"', ""))
        .filter(|k| !k.is_empty())
        .map(|k| format!("all:\"{k}\""))
        .collect();
    let mut query = format!("({})", terms.join(" OR "));

    let cats: Vec<String> = categories
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| format!("cat:{c}"))
        .collect();
    if !cats.is_empty() {
        query = format!("{query} AND ({})", cats.join(" OR "));
    }
    query
}

/// Fetches recent submissions from arXiv.
#[derive(Debug, Clone)]
pub struct ArxivFetcher {
    client: HttpClient,
    base_url: String,
    delay: std::time::Duration,
}

impl ArxivFetcher {
    /// Create a fetcher against the configured arXiv endpoint.
    #[must_use]
    pub fn new(client: HttpClient, config: &Config) -> Self {
        Self { client, base_url: config.arxiv_api_url.clone(), delay: config.arxiv_delay }
    }

    async fn fetch_inner(&self, query: &SourceQuery) -> ClientResult<Vec<Paper>> {
        let cap = query.preprint_cap();
        let params = vec![
            ("search_query".to_string(), build_search_query(&query.keywords, &query.arxiv_categories)),
            ("start".to_string(), "0".to_string()),
            ("max_results".to_string(), cap.to_string()),
            ("sortBy".to_string(), "submittedDate".to_string()),
            ("sortOrder".to_string(), "descending".to_string()),
        ];

        let xml = self.client.get_text(&self.base_url, &params, self.delay).await?;
        let cutoff = query.cutoff();

        Ok(parse_feed(&xml)?
            .into_iter()
            .filter(|p| within_window(p, cutoff))
            .take(cap)
            .collect())
    }
}

/// Entries with an unknown date are kept; the feed is already newest-first.
fn within_window(paper: &Paper, cutoff: NaiveDate) -> bool {
    paper.published_date().is_none_or(|d| d >= cutoff)
}

#[async_trait::async_trait]
impl SourceFetcher for ArxivFetcher {
    fn source(&self) -> Source {
        Source::Arxiv
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<Paper>, FetchError> {
        self.fetch_inner(query).await.map_err(|e| FetchError::from_client(Source::Arxiv, &e))
    }
}
