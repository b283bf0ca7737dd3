//! Mock-based tests for the arXiv, bioRxiv/medRxiv and PubMed fetchers.

mod common;

use serde_json::json;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use research_digest::client::HttpClient;
use research_digest::models::{DataSources, Source};
use research_digest::sources::{Fetcher, SourceFetcher, SourceQuery};
use research_digest::Config;

use common::{AtomEntry, PubmedArticle};

fn fetcher(server: &MockServer, source: Source) -> Fetcher {
    let config = Config::for_testing(&server.uri());
    let client = HttpClient::new(&config).unwrap();
    Fetcher::for_source(source, client, &config)
}

fn query(source: Source) -> SourceQuery {
    let settings = common::settings(&["amyloid", "tau"]);
    SourceQuery::new(&common::request(&settings, DataSources::all()), source, common::today())
}

// =============================================================================
// arXiv
// =============================================================================

#[tokio::test]
async fn test_arxiv_sends_keyword_query_and_cuts_window() {
    let server = MockServer::start().await;
    let feed = common::atom_feed(&[
        AtomEntry { id: "2403.1v1", title: "Inside window", summary: "amyloid", published: "2024-03-09" },
        AtomEntry { id: "2402.1v1", title: "Too old", summary: "tau", published: "2024-02-20" },
    ]);

    Mock::given(method("GET"))
        .and(path("/arxiv/api/query"))
        .and(query_param("search_query", r#"(all:"amyloid" OR all:"tau")"#))
        .and(query_param("sortBy", "submittedDate"))
        .and(query_param("max_results", "150"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed))
        .expect(1)
        .mount(&server)
        .await;

    let papers = fetcher(&server, Source::Arxiv).fetch(&query(Source::Arxiv)).await.unwrap();

    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].title, "Inside window");
    assert_eq!(papers[0].source, Source::Arxiv);
    assert_eq!(papers[0].authors, "Arxiv Author");
}

#[tokio::test]
async fn test_arxiv_malformed_feed_is_fetch_error() {
    let server = MockServer::start().await;
    common::mount_arxiv(&server, "<feed><entry><title>broken".to_string()).await;

    let err = fetcher(&server, Source::Arxiv).fetch(&query(Source::Arxiv)).await.unwrap_err();
    assert_eq!(err.source, Source::Arxiv);
    assert!(err.to_string().starts_with("arXiv: "));
}

// =============================================================================
// bioRxiv / medRxiv
// =============================================================================

#[tokio::test]
async fn test_rxiv_paginates_and_keeps_latest_version() {
    let server = MockServer::start().await;

    let first: Vec<_> = (0..100)
        .map(|i| common::rxiv_record(&format!("10.1101/{i}"), &format!("Paper {i}"), "tau", "2024-03-05", 1))
        .collect();
    let second = vec![
        common::rxiv_record("10.1101/0", "Paper 0 revised", "tau", "2024-03-07", 2),
        common::rxiv_record("10.1101/100", "Paper 100", "amyloid", "2024-03-07", 1),
    ];

    Mock::given(method("GET"))
        .and(path("/rxiv/details/biorxiv/2024-03-03/2024-03-10/0/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::rxiv_page(first, 102)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rxiv/details/biorxiv/2024-03-03/2024-03-10/100/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::rxiv_page(second, 102)))
        .expect(1)
        .mount(&server)
        .await;
    common::mount_rxiv(&server, "medrxiv", common::rxiv_page(vec![], 0)).await;

    let papers = fetcher(&server, Source::Biorxiv).fetch(&query(Source::Biorxiv)).await.unwrap();

    assert_eq!(papers.len(), 101);
    assert_eq!(papers[0].title, "Paper 0 revised");
    assert!(papers[0].url.ends_with("10.1101/0v2"));
    assert!(papers.iter().all(|p| p.source == Source::Biorxiv));
}

#[tokio::test]
async fn test_rxiv_merges_both_servers() {
    let server = MockServer::start().await;
    common::mount_rxiv(
        &server,
        "biorxiv",
        common::rxiv_page(vec![common::rxiv_record("10.1101/b", "Bio", "tau", "2024-03-05", 1)], 1),
    )
    .await;
    common::mount_rxiv(
        &server,
        "medrxiv",
        common::rxiv_page(vec![common::rxiv_record("10.1101/m", "Med", "tau", "2024-03-05", 1)], 1),
    )
    .await;

    let papers = fetcher(&server, Source::Biorxiv).fetch(&query(Source::Biorxiv)).await.unwrap();
    let titles: Vec<&str> = papers.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Bio", "Med"]);
    assert!(papers[1].url.starts_with("https://www.medrxiv.org/content/"));
}

#[tokio::test]
async fn test_rxiv_server_error_names_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/rxiv/details/biorxiv/.*"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = fetcher(&server, Source::Biorxiv).fetch(&query(Source::Biorxiv)).await.unwrap_err();
    assert!(err.to_string().starts_with("bioRxiv/medRxiv: biorxiv: Server error (503)"));
}

#[tokio::test]
async fn test_rxiv_keeps_papers_from_healthy_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/rxiv/details/biorxiv/.*"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;
    common::mount_rxiv(
        &server,
        "medrxiv",
        common::rxiv_page(vec![common::rxiv_record("10.1101/m", "Med", "tau", "2024-03-05", 1)], 1),
    )
    .await;

    let papers = fetcher(&server, Source::Biorxiv).fetch(&query(Source::Biorxiv)).await.unwrap();
    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].title, "Med");
    assert!(papers[0].url.starts_with("https://www.medrxiv.org/content/"));
}

// =============================================================================
// PubMed
// =============================================================================

#[tokio::test]
async fn test_pubmed_search_then_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/eutils/esearch.fcgi"))
        .and(query_param("db", "pubmed"))
        .and(query_param("reldate", "7"))
        .and(query_param("datetype", "pdat"))
        .and(query_param("retmax", "100"))
        .and(query_param("tool", "research-digest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::esearch_json(&["111", "222"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/eutils/efetch.fcgi"))
        .and(query_param("id", "111,222"))
        .and(query_param("retmode", "xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::efetch_xml(&[
            PubmedArticle {
                pmid: "111",
                title: "Amyloid imaging.",
                abstract_text: "Text",
                journal: "Brain",
                year: "2024",
                month: "03",
                day: "02",
            },
            PubmedArticle {
                pmid: "222",
                title: "Tau imaging",
                abstract_text: "",
                journal: "Neuron",
                year: "2024",
                month: "Feb",
                day: "",
            },
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let papers = fetcher(&server, Source::Pubmed).fetch(&query(Source::Pubmed)).await.unwrap();

    assert_eq!(papers.len(), 2);
    assert_eq!(papers[0].title, "Amyloid imaging");
    assert_eq!(papers[0].journal, "Brain");
    assert_eq!(papers[0].published, "2024-03-02");
    assert_eq!(papers[0].authors, "Marie Curie");
    assert_eq!(papers[0].url, "https://pubmed.ncbi.nlm.nih.gov/111/");
    assert_eq!(papers[1].published, "2024-02-01");
}

#[tokio::test]
async fn test_pubmed_no_hits_skips_efetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/eutils/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::esearch_json(&[])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/eutils/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let papers = fetcher(&server, Source::Pubmed).fetch(&query(Source::Pubmed)).await.unwrap();
    assert!(papers.is_empty());
}

#[tokio::test]
async fn test_pubmed_rate_limit_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/eutils/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2"))
        .mount(&server)
        .await;

    let err = fetcher(&server, Source::Pubmed).fetch(&query(Source::Pubmed)).await.unwrap_err();
    assert_eq!(err.source, Source::Pubmed);
    assert!(err.message.contains("Rate limited"));
}

#[tokio::test]
async fn test_pubmed_esearch_error_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/eutils/esearch.fcgi"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"esearchresult": {"ERROR": "Invalid query"}})),
        )
        .mount(&server)
        .await;

    let err = fetcher(&server, Source::Pubmed).fetch(&query(Source::Pubmed)).await.unwrap_err();
    assert!(err.message.contains("Invalid query"));
}
