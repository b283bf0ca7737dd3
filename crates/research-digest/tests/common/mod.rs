//! Mock server fixtures shared by the integration test files.
#![allow(dead_code)]

use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use research_digest::models::{DataSources, SearchMode};
use research_digest::{Config, DigestService, FetchRequest, Settings};

/// End of the lookback window used by every mock-backed test.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
}

pub fn service(server: &MockServer) -> DigestService {
    DigestService::new(&Config::for_testing(&server.uri())).unwrap()
}

pub fn settings(keywords: &[&str]) -> Settings {
    Settings {
        keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        ..Settings::default()
    }
}

pub fn request(settings: &Settings, sources: DataSources) -> FetchRequest {
    FetchRequest::from_settings(settings, sources, SearchMode::Brief, 7)
}

// =============================================================================
// arXiv
// =============================================================================

pub struct AtomEntry<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub summary: &'a str,
    pub published: &'a str,
}

pub fn atom_feed(entries: &[AtomEntry<'_>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>arXiv Query</title>
"#,
    );
    for e in entries {
        xml.push_str(&format!(
            r#"  <entry>
    <id>http://arxiv.org/abs/{id}</id>
    <published>{published}T12:00:00Z</published>
    <title>{title}</title>
    <summary>{summary}</summary>
    <author><name>Arxiv Author</name></author>
    <link href="http://arxiv.org/abs/{id}" rel="alternate" type="text/html"/>
  </entry>
"#,
            id = e.id,
            published = e.published,
            title = e.title,
            summary = e.summary
        ));
    }
    xml.push_str("</feed>");
    xml
}

pub async fn mount_arxiv(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path("/arxiv/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

// =============================================================================
// bioRxiv / medRxiv
// =============================================================================

pub fn rxiv_record(doi: &str, title: &str, abstract_text: &str, date: &str, version: u32) -> serde_json::Value {
    json!({
        "doi": doi,
        "title": title,
        "authors": "Preprint, P.; Author, A.",
        "date": date,
        "version": version.to_string(),
        "type": "new results",
        "category": "neuroscience",
        "abstract": abstract_text,
        "server": "bioRxiv"
    })
}

pub fn rxiv_page(records: Vec<serde_json::Value>, total: usize) -> serde_json::Value {
    json!({
        "messages": [{"status": "ok", "count": records.len(), "total": total.to_string()}],
        "collection": records
    })
}

pub async fn mount_rxiv(server: &MockServer, rxiv_server: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path_regex(format!(r"^/rxiv/details/{rxiv_server}/.*")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount an empty listing for both preprint servers.
pub async fn mount_rxiv_empty(server: &MockServer) {
    for name in ["biorxiv", "medrxiv"] {
        mount_rxiv(server, name, json!({"messages": [{"status": "no posts found"}], "collection": []})).await;
    }
}

// =============================================================================
// PubMed
// =============================================================================

pub struct PubmedArticle<'a> {
    pub pmid: &'a str,
    pub title: &'a str,
    pub abstract_text: &'a str,
    pub journal: &'a str,
    pub year: &'a str,
    pub month: &'a str,
    pub day: &'a str,
}

pub fn efetch_xml(articles: &[PubmedArticle<'_>]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" ?>\n<PubmedArticleSet>\n");
    for a in articles {
        xml.push_str(&format!(
            r#"  <PubmedArticle>
    <MedlineCitation Status="MEDLINE" Owner="NLM">
      <PMID Version="1">{pmid}</PMID>
      <Article PubModel="Print">
        <Journal>
          <JournalIssue CitedMedium="Internet">
            <Volume>12</Volume>
            <Issue>1</Issue>
            <PubDate><Year>{year}</Year><Month>{month}</Month><Day>{day}</Day></PubDate>
          </JournalIssue>
          <Title>{journal}</Title>
        </Journal>
        <ArticleTitle>{title}</ArticleTitle>
        <Abstract><AbstractText>{abstract_text}</AbstractText></Abstract>
        <AuthorList><Author><LastName>Curie</LastName><ForeName>Marie</ForeName></Author></AuthorList>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
"#,
            pmid = a.pmid,
            year = a.year,
            month = a.month,
            day = a.day,
            journal = a.journal,
            title = a.title,
            abstract_text = a.abstract_text
        ));
    }
    xml.push_str("</PubmedArticleSet>");
    xml
}

pub fn esearch_json(ids: &[&str]) -> serde_json::Value {
    json!({
        "header": {"type": "esearch", "version": "0.3"},
        "esearchresult": {"count": ids.len().to_string(), "retmax": ids.len().to_string(), "idlist": ids}
    })
}

pub async fn mount_pubmed(server: &MockServer, articles: &[PubmedArticle<'_>]) {
    let ids: Vec<&str> = articles.iter().map(|a| a.pmid).collect();
    Mock::given(method("GET"))
        .and(path("/eutils/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_json(&ids)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/eutils/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(efetch_xml(articles)))
        .mount(server)
        .await;
}

/// One matching paper per source, all inside the lookback window.
pub async fn mount_all_sources(server: &MockServer) {
    mount_arxiv(
        server,
        atom_feed(&[AtomEntry {
            id: "2403.00001v1",
            title: "Amyloid PET harmonization",
            summary: "Harmonizing amyloid PET across scanners.",
            published: "2024-03-08",
        }]),
    )
    .await;
    mount_rxiv(
        server,
        "biorxiv",
        rxiv_page(
            vec![rxiv_record("10.1101/2024.03.05.1", "Tau seeding in organoids", "Tau aggregates spread.", "2024-03-06", 1)],
            1,
        ),
    )
    .await;
    mount_rxiv(server, "medrxiv", rxiv_page(vec![], 0)).await;
    mount_pubmed(
        server,
        &[PubmedArticle {
            pmid: "38000001",
            title: "Plasma biomarkers of Alzheimer's disease",
            abstract_text: "Plasma p-tau217 tracks amyloid burden.",
            journal: "Nature Medicine",
            year: "2024",
            month: "Mar",
            day: "04",
        }],
    )
    .await;
}
