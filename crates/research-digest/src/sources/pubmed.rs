//! PubMed fetcher over NCBI E-utilities: `esearch` for ids, `efetch` for records.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Deserialize;

use super::{SourceFetcher, SourceQuery, clean_text, clean_title};
use crate::client::HttpClient;
use crate::config::{Config, api};
use crate::error::{ClientError, ClientResult, FetchError};
use crate::models::{Paper, Source};

#[derive(Debug, Default, Deserialize)]
struct EsearchResponse {
    #[serde(default)]
    esearchresult: EsearchResult,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
    #[serde(rename = "ERROR", default)]
    error: Option<String>,
}

/// Build the esearch term: each keyword quoted and restricted to title and
/// abstract, OR-ed together.
#[must_use]
pub fn build_term(keywords: &[String]) -> String {
    keywords
        .iter()
        .map(|k| k.trim().replace('"', ""))
        .filter(|k| !k.is_empty())
        .map(|k| format!("\"{k}\"[Title/Abstract]"))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Year, month and day pieces as they appear in PubMed XML.
#[derive(Debug, Default, Clone)]
struct DateParts {
    year: String,
    month: String,
    day: String,
}

impl DateParts {
    /// `YYYY-MM-DD`, missing month or day filled with `01`.
    fn to_iso(&self) -> Option<String> {
        let year = self.year.trim();
        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let month = month_number(&self.month).unwrap_or(1);
        let day = self.day.trim().parse::<u32>().ok().filter(|d| (1..=31).contains(d)).unwrap_or(1);
        Some(format!("{year}-{month:02}-{day:02}"))
    }

    /// Parse a free-form `MedlineDate` such as `2023 Dec-2024 Jan`.
    fn from_medline(text: &str) -> Self {
        let mut tokens = text.split(|c: char| c.is_whitespace() || c == '-');
        let year = tokens.next().unwrap_or_default().to_string();
        let month = tokens.next().unwrap_or_default().to_string();
        Self { year, month, day: String::new() }
    }
}

/// Month as a number from `03`, `3` or `Mar`/`March`.
fn month_number(month: &str) -> Option<u32> {
    let month = month.trim();
    if let Ok(n) = month.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    const NAMES: [&str; 12] =
        ["jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"];
    let prefix = month.get(..3)?.to_ascii_lowercase();
    NAMES.iter().position(|n| *n == prefix).and_then(|i| u32::try_from(i + 1).ok())
}

#[derive(Debug, Default)]
struct ArticleAccum {
    pmid: String,
    title: String,
    abstract_parts: Vec<String>,
    authors: Vec<String>,
    last_name: String,
    fore_name: String,
    collective_name: String,
    journal: String,
    volume: String,
    issue: String,
    pub_date: DateParts,
    medline_date: String,
    article_date: DateParts,
}

impl ArticleAccum {
    fn finish_author(&mut self) {
        let name = if self.collective_name.trim().is_empty() {
            format!("{} {}", self.fore_name.trim(), self.last_name.trim())
        } else {
            self.collective_name.clone()
        };
        let name = clean_text(&name);
        if !name.is_empty() {
            self.authors.push(name);
        }
        self.last_name.clear();
        self.fore_name.clear();
        self.collective_name.clear();
    }

    fn published(&self) -> String {
        self.pub_date
            .to_iso()
            .or_else(|| DateParts::from_medline(&self.medline_date).to_iso())
            .or_else(|| self.article_date.to_iso())
            .unwrap_or_default()
    }

    fn into_paper(self) -> Option<Paper> {
        let title = clean_title(&self.title);
        if title.is_empty() {
            tracing::debug!(pmid = %self.pmid, "Skipping PubMed record without title");
            return None;
        }

        let mut paper = Paper::new(Source::Pubmed, title);
        paper.published = self.published();
        paper.r#abstract = clean_text(&self.abstract_parts.join(" "));
        paper.authors = self.authors.join(", ");
        paper.journal = clean_text(&self.journal);
        paper.volume = self.volume.trim().to_string();
        paper.issue = self.issue.trim().to_string();
        let pmid = self.pmid.trim();
        if !pmid.is_empty() {
            paper.url = format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/");
        }
        Some(paper)
    }
}

/// Event-driven parser for `PubmedArticleSet` documents.
#[derive(Debug, Default)]
struct PubmedParser {
    papers: Vec<Paper>,
    stack: Vec<String>,
    current: Option<ArticleAccum>,
}

impl PubmedParser {
    fn handle_start(&mut self, e: &BytesStart<'_>) {
        let tag = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
        match tag.as_str() {
            "PubmedArticle" => self.current = Some(ArticleAccum::default()),
            "AbstractText" => {
                if let Some(article) = self.current.as_mut() {
                    article.abstract_parts.push(String::new());
                }
            }
            _ => {}
        }
        self.stack.push(tag);
    }

    fn handle_text(&mut self, text: &str) {
        let stack = &self.stack;
        let inside = |name: &str| stack.iter().any(|s| s == name);
        let tag = stack.last().map(String::as_str).unwrap_or_default();
        let parent = stack.len().checked_sub(2).map_or("", |i| stack[i].as_str());

        let Some(article) = self.current.as_mut() else {
            return;
        };

        let field = if inside("ArticleTitle") {
            &mut article.title
        } else if inside("AbstractText") {
            match article.abstract_parts.last_mut() {
                Some(part) => part,
                None => return,
            }
        } else if inside("CollectiveName") {
            &mut article.collective_name
        } else if inside("Author") {
            match tag {
                "LastName" => &mut article.last_name,
                "ForeName" => &mut article.fore_name,
                _ => return,
            }
        } else if inside("PubDate") {
            match tag {
                "Year" => &mut article.pub_date.year,
                "Month" => &mut article.pub_date.month,
                "Day" => &mut article.pub_date.day,
                "MedlineDate" => &mut article.medline_date,
                _ => return,
            }
        } else if inside("ArticleDate") {
            match tag {
                "Year" => &mut article.article_date.year,
                "Month" => &mut article.article_date.month,
                "Day" => &mut article.article_date.day,
                _ => return,
            }
        } else {
            match (parent, tag) {
                ("MedlineCitation", "PMID") => &mut article.pmid,
                ("Journal", "Title") => &mut article.journal,
                ("JournalIssue", "Volume") => &mut article.volume,
                ("JournalIssue", "Issue") => &mut article.issue,
                _ => return,
            }
        };
        field.push_str(text);
    }

    fn handle_end(&mut self) {
        let Some(tag) = self.stack.pop() else {
            return;
        };
        match tag.as_str() {
            "Author" => {
                if let Some(article) = self.current.as_mut() {
                    article.finish_author();
                }
            }
            "PubmedArticle" => {
                if let Some(paper) = self.current.take().and_then(ArticleAccum::into_paper) {
                    self.papers.push(paper);
                }
            }
            _ => {}
        }
    }
}

/// Parse an efetch `PubmedArticleSet` document into papers.
///
/// # Errors
///
/// Returns [`ClientError::Xml`] when the document is not well-formed.
pub fn parse_pubmed_xml(xml: &str) -> ClientResult<Vec<Paper>> {
    let mut reader = Reader::from_str(xml);
    let mut parser = PubmedParser::default();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => parser.handle_start(e),
            Event::Text(ref e) => {
                let text = e
                    .unescape()
                    .unwrap_or_else(|_| Cow::Owned(String::from_utf8_lossy(e).into_owned()));
                parser.handle_text(&text);
            }
            Event::CData(ref e) => parser.handle_text(&String::from_utf8_lossy(e)),
            Event::End(_) => parser.handle_end(),
            Event::Eof => break,
            _ => {}
        }
    }

    if !parser.stack.is_empty() {
        return Err(ClientError::xml(format!(
            "unexpected end of document inside <{}>",
            parser.stack.join("/")
        )));
    }

    Ok(parser.papers)
}

/// Fetches recent PubMed records matching the keywords.
#[derive(Debug, Clone)]
pub struct PubmedFetcher {
    client: HttpClient,
    base_url: String,
    delay: std::time::Duration,
    email: Option<String>,
    api_key: Option<String>,
}

impl PubmedFetcher {
    /// Create a fetcher against the configured E-utilities root.
    #[must_use]
    pub fn new(client: HttpClient, config: &Config) -> Self {
        Self {
            client,
            base_url: config.eutils_api_url.trim_end_matches('/').to_string(),
            delay: config.pubmed_delay,
            email: config.ncbi_email.clone(),
            api_key: config.ncbi_api_key.clone(),
        }
    }

    /// Parameters every E-utilities call carries.
    fn common_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("db".to_string(), "pubmed".to_string()),
            ("tool".to_string(), api::NCBI_TOOL.to_string()),
        ];
        if let Some(email) = &self.email {
            params.push(("email".to_string(), email.clone()));
        }
        if let Some(key) = &self.api_key {
            params.push(("api_key".to_string(), key.clone()));
        }
        params
    }

    async fn search_ids(&self, query: &SourceQuery) -> ClientResult<Vec<String>> {
        let mut params = self.common_params();
        params.extend([
            ("term".to_string(), build_term(&query.keywords)),
            ("retmax".to_string(), query.result_limit.to_string()),
            ("retmode".to_string(), "json".to_string()),
            ("sort".to_string(), "pub_date".to_string()),
            ("datetype".to_string(), "pdat".to_string()),
            ("reldate".to_string(), query.days_back.to_string()),
        ]);

        let url = format!("{}/esearch.fcgi", self.base_url);
        let response: EsearchResponse = self.client.get_json(&url, &params, self.delay).await?;

        if let Some(err) = response.error.or(response.esearchresult.error) {
            return Err(ClientError::bad_request(err));
        }
        Ok(response.esearchresult.idlist)
    }

    async fn fetch_inner(&self, query: &SourceQuery) -> ClientResult<Vec<Paper>> {
        let ids = self.search_ids(query).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut params = self.common_params();
        params.extend([
            ("id".to_string(), ids.join(",")),
            ("retmode".to_string(), "xml".to_string()),
            ("rettype".to_string(), "abstract".to_string()),
        ]);

        let url = format!("{}/efetch.fcgi", self.base_url);
        let xml = self.client.get_text(&url, &params, self.delay).await?;
        let mut papers = parse_pubmed_xml(&xml)?;
        papers.truncate(query.result_limit);
        Ok(papers)
    }
}

#[async_trait::async_trait]
impl SourceFetcher for PubmedFetcher {
    fn source(&self) -> Source {
        Source::Pubmed
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<Paper>, FetchError> {
        self.fetch_inner(query).await.map_err(|e| FetchError::from_client(Source::Pubmed, &e))
    }
}
