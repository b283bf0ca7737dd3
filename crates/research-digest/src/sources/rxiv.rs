//! bioRxiv/medRxiv fetcher over the `details` listing API.
//!
//! The API has no keyword search, so this pulls the recency window page by
//! page and leaves relevance to the scorer.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use super::{SourceFetcher, SourceQuery, clean_text, clean_title};
use crate::client::HttpClient;
use crate::config::Config;
use crate::error::{ClientResult, FetchError};
use crate::models::{Paper, Source};
use crate::settings::RxivServer;

/// Records per `details` page.
const PAGE_SIZE: usize = 100;

#[derive(Debug, Default, Deserialize)]
struct DetailsResponse {
    #[serde(default)]
    messages: Vec<DetailsMessage>,
    #[serde(default)]
    collection: Vec<RxivRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct DetailsMessage {
    #[serde(default)]
    total: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RxivRecord {
    #[serde(default)]
    doi: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    version: Value,
    #[serde(rename = "abstract", default)]
    r#abstract: String,
}

impl DetailsResponse {
    /// Total records in the window, reported as a string or a number.
    fn total(&self) -> Option<usize> {
        self.messages.first().and_then(|m| as_usize(&m.total))
    }
}

impl RxivRecord {
    fn version(&self) -> usize {
        as_usize(&self.version).unwrap_or(1)
    }

    fn into_paper(self, server: RxivServer) -> Option<Paper> {
        let title = clean_title(&self.title);
        if title.is_empty() {
            tracing::debug!(doi = %self.doi, server = server.as_str(), "Skipping record without title");
            return None;
        }

        let mut paper = Paper::new(Source::Biorxiv, title);
        paper.r#abstract = clean_text(&self.r#abstract);
        paper.published = self.date.trim().to_string();
        paper.authors = format_authors(&self.authors);
        if !self.doi.trim().is_empty() {
            paper.url = format!(
                "https://www.{}.org/content/{}v{}",
                server.as_str(),
                self.doi.trim(),
                self.version()
            );
        }
        Some(paper)
    }
}

fn as_usize(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `"Smith, J.; Doe, A."` becomes `"J. Smith, A. Doe"`.
fn format_authors(raw: &str) -> String {
    raw.split(';')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|a| match a.split_once(',') {
            Some((last, first)) if !first.trim().is_empty() => {
                format!("{} {}", first.trim(), last.trim())
            }
            _ => a.trim_end_matches(',').to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Keeps the highest version of each DOI, in first-seen order.
#[derive(Debug, Default)]
struct VersionIndex {
    records: Vec<RxivRecord>,
    by_doi: HashMap<String, usize>,
}

impl VersionIndex {
    fn merge(&mut self, record: RxivRecord) {
        let doi = record.doi.trim().to_lowercase();
        if doi.is_empty() {
            self.records.push(record);
            return;
        }
        match self.by_doi.get(&doi) {
            Some(&idx) => {
                if record.version() > self.records[idx].version() {
                    self.records[idx] = record;
                }
            }
            None => {
                self.by_doi.insert(doi, self.records.len());
                self.records.push(record);
            }
        }
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Parse one `details` page into papers, keeping the latest version per DOI.
///
/// # Errors
///
/// Returns [`ClientError::Parse`](crate::error::ClientError::Parse) if the
/// body is not a valid `details` response.
pub fn parse_details(body: &str, server: RxivServer) -> ClientResult<Vec<Paper>> {
    let page: DetailsResponse = serde_json::from_str(body)?;
    let mut index = VersionIndex::default();
    for record in page.collection {
        index.merge(record);
    }
    Ok(index.records.into_iter().filter_map(|r| r.into_paper(server)).collect())
}

/// Fetches the recency window from each configured preprint server.
#[derive(Debug, Clone)]
pub struct RxivFetcher {
    client: HttpClient,
    base_url: String,
    delay: std::time::Duration,
}

impl RxivFetcher {
    /// Create a fetcher against the configured details API root.
    #[must_use]
    pub fn new(client: HttpClient, config: &Config) -> Self {
        Self { client, base_url: config.rxiv_api_url.clone(), delay: config.rxiv_delay }
    }

    async fn fetch_server(
        &self,
        server: RxivServer,
        query: &SourceQuery,
    ) -> ClientResult<Vec<Paper>> {
        let cap = query.preprint_cap();
        let from = query.cutoff().format("%Y-%m-%d");
        let to = query.today.format("%Y-%m-%d");
        let mut index = VersionIndex::default();
        let mut cursor = 0usize;

        loop {
            let url = format!(
                "{}/details/{}/{from}/{to}/{cursor}/json",
                self.base_url.trim_end_matches('/'),
                server.as_str()
            );
            let page: DetailsResponse = self.client.get_json(&url, &[], self.delay).await?;
            let total = page.total();
            let received = page.collection.len();
            for record in page.collection {
                index.merge(record);
            }
            cursor += received;

            tracing::debug!(server = server.as_str(), cursor, total = ?total, "Fetched details page");

            if received == 0
                || index.len() >= cap
                || total.is_some_and(|t| cursor >= t)
                || (total.is_none() && received < PAGE_SIZE)
            {
                break;
            }
        }

        Ok(index.records.into_iter().take(cap).filter_map(|r| r.into_paper(server)).collect())
    }
}

#[async_trait::async_trait]
impl SourceFetcher for RxivFetcher {
    fn source(&self) -> Source {
        Source::Biorxiv
    }

    /// Lists every configured server. Fails only when all of them fail.
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<Paper>, FetchError> {
        let mut papers = Vec::new();
        let mut failures = Vec::new();
        for &server in &query.rxiv_servers {
            match self.fetch_server(server, query).await {
                Ok(batch) => papers.extend(batch),
                Err(e) => {
                    tracing::warn!(server = server.as_str(), error = %e, "Preprint server failed");
                    failures.push(format!("{}: {e}", server.as_str()));
                }
            }
        }

        if !failures.is_empty() && failures.len() == query.rxiv_servers.len() {
            return Err(FetchError::new(Source::Biorxiv, failures.join("; ")));
        }
        Ok(papers)
    }
}
