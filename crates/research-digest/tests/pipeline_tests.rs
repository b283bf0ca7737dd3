//! End-to-end fetch, rank and export tests against mocked sources.

mod common;

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use research_digest::models::{DataSources, Source};
use research_digest::settings::{JournalRules, JournalScoring};
use research_digest::{Config, DigestError, DigestService};

use common::{AtomEntry, PubmedArticle};

const KEYWORDS: &[&str] = &["Alzheimer's disease", "amyloid", "tau", "PET", "biomarker"];

// =============================================================================
// Failure isolation
// =============================================================================

#[tokio::test]
async fn test_all_sources_contribute() {
    let server = MockServer::start().await;
    common::mount_all_sources(&server).await;

    let settings = common::settings(KEYWORDS);
    let result = common::service(&server)
        .fetch_as_of(&common::request(&settings, DataSources::all()), common::today())
        .await
        .unwrap();

    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    assert_eq!(result.total_before_filter, 3);
    assert_eq!(result.total_after_filter, 3);
    let sources: Vec<Source> = result.papers.iter().map(|p| p.source).collect();
    assert!(sources.contains(&Source::Arxiv));
    assert!(sources.contains(&Source::Biorxiv));
    assert!(sources.contains(&Source::Pubmed));
}

#[tokio::test]
async fn test_failing_source_is_isolated() {
    let server = MockServer::start().await;
    common::mount_arxiv(
        &server,
        common::atom_feed(&[AtomEntry {
            id: "2403.2v1",
            title: "Tau PET staging",
            summary: "",
            published: "2024-03-09",
        }]),
    )
    .await;
    common::mount_rxiv_empty(&server).await;
    Mock::given(method("GET"))
        .and(path("/eutils/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
        .mount(&server)
        .await;

    let settings = common::settings(KEYWORDS);
    let result = common::service(&server)
        .fetch_as_of(&common::request(&settings, DataSources::all()), common::today())
        .await
        .unwrap();

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("PubMed: Server error (500)"));
    assert_eq!(result.papers.len(), 1);
    assert_eq!(result.papers[0].title, "Tau PET staging");
    assert!(!result.candidates_per_source.contains_key(&Source::Pubmed));
}

#[tokio::test]
async fn test_slow_source_times_out_without_blocking_others() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/arxiv/api/query"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(common::atom_feed(&[]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    common::mount_pubmed(
        &server,
        &[PubmedArticle {
            pmid: "1",
            title: "Amyloid biomarker panel",
            abstract_text: "",
            journal: "PLoS One",
            year: "2024",
            month: "03",
            day: "05",
        }],
    )
    .await;

    let config = Config { source_timeout: Duration::from_millis(300), ..Config::for_testing(&server.uri()) };
    let service = DigestService::new(&config).unwrap();
    let settings = common::settings(KEYWORDS);
    let sources = DataSources::none().with(Source::Arxiv).with(Source::Pubmed);

    let result = service.fetch_as_of(&common::request(&settings, sources), common::today()).await.unwrap();

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("arXiv: timed out"));
    assert_eq!(result.papers.len(), 1);
    assert_eq!(result.papers[0].source, Source::Pubmed);
}

#[tokio::test]
async fn test_disabled_sources_are_not_called() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/arxiv/api/query"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    common::mount_pubmed(&server, &[]).await;

    let settings = common::settings(KEYWORDS);
    let sources = DataSources::none().with(Source::Pubmed);
    let result = common::service(&server)
        .fetch_as_of(&common::request(&settings, sources), common::today())
        .await
        .unwrap();
    assert!(result.is_empty());
    assert!(result.errors.is_empty());
}

// =============================================================================
// Configuration errors
// =============================================================================

#[tokio::test]
async fn test_no_sources_fails_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let settings = common::settings(KEYWORDS);
    let err = common::service(&server)
        .fetch_as_of(&common::request(&settings, DataSources::none()), common::today())
        .await
        .unwrap_err();
    assert!(matches!(err, DigestError::Configuration(_)));
}

#[tokio::test]
async fn test_empty_keywords_fails_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let settings = common::settings(&[]);
    let err = common::service(&server)
        .fetch_as_of(&common::request(&settings, DataSources::all()), common::today())
        .await
        .unwrap_err();
    assert!(err.to_user_message().contains("keyword list is empty"));
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_pet_only_paper_matches_pet() {
    let server = MockServer::start().await;
    common::mount_pubmed(
        &server,
        &[PubmedArticle {
            pmid: "7",
            title: "PET imaging of synaptic density",
            abstract_text: "A new tracer.",
            journal: "PLoS One",
            year: "2024",
            month: "03",
            day: "01",
        }],
    )
    .await;

    let mut settings = common::settings(&["Alzheimer's disease", "PET"]);
    settings.min_keyword_matches = 1;
    let pet_weight = settings.keyword_weight("PET");

    let result = common::service(&server)
        .fetch_as_of(&common::request(&settings, DataSources::none().with(Source::Pubmed)), common::today())
        .await
        .unwrap();

    assert_eq!(result.papers.len(), 1);
    assert_eq!(result.papers[0].matched_keywords, vec!["PET".to_string()]);
    assert!(result.papers[0].relevance_score >= pet_weight);
}

#[tokio::test]
async fn test_specific_journal_gets_top_bucket_boost() {
    let server = MockServer::start().await;
    common::mount_pubmed(
        &server,
        &[PubmedArticle {
            pmid: "8",
            title: "Alzheimer's disease amyloid and tau PET biomarker study",
            abstract_text: "",
            journal: "Nature Medicine",
            year: "2024",
            month: "03",
            day: "01",
        }],
    )
    .await;

    let mut settings = common::settings(KEYWORDS);
    settings.journals = JournalRules {
        exact_matches: vec![],
        family_matches: vec![],
        specific_journals: vec!["Nature Medicine".into()],
        exclusions: vec![],
    };
    settings.journal_scoring = JournalScoring::default();
    let keyword_score: f64 = KEYWORDS.iter().map(|k| settings.keyword_weight(k)).sum();

    let result = common::service(&server)
        .fetch_as_of(&common::request(&settings, DataSources::none().with(Source::Pubmed)), common::today())
        .await
        .unwrap();

    let paper = &result.papers[0];
    assert_eq!(paper.matched_keywords.len(), 5);
    assert!(paper.is_high_impact);
    assert!((paper.relevance_score - (keyword_score + 5.1)).abs() < 1e-9);
}

#[tokio::test]
async fn test_exclusion_beats_specific_journal() {
    let server = MockServer::start().await;
    common::mount_pubmed(
        &server,
        &[PubmedArticle {
            pmid: "9",
            title: "Amyloid PET",
            abstract_text: "",
            journal: "Nature Medicine",
            year: "2024",
            month: "03",
            day: "01",
        }],
    )
    .await;

    let mut settings = common::settings(KEYWORDS);
    settings.journals = JournalRules {
        exact_matches: vec![],
        family_matches: vec![],
        specific_journals: vec!["Nature Medicine".into()],
        exclusions: vec!["Nature Medicine".into()],
    };
    let keyword_score = settings.keyword_weight("amyloid") + settings.keyword_weight("PET");

    let result = common::service(&server)
        .fetch_as_of(&common::request(&settings, DataSources::none().with(Source::Pubmed)), common::today())
        .await
        .unwrap();

    let paper = &result.papers[0];
    assert!(!paper.is_high_impact);
    assert!((paper.relevance_score - keyword_score).abs() < 1e-9);
}

#[tokio::test]
async fn test_export_before_any_fetch() {
    let server = MockServer::start().await;
    let err = common::service(&server).export().await.unwrap_err();
    assert!(matches!(err, DigestError::NoCachedResult));
}

// =============================================================================
// Cache and determinism
// =============================================================================

#[tokio::test]
async fn test_export_reuses_last_fetch() {
    let server = MockServer::start().await;
    common::mount_all_sources(&server).await;

    let service = common::service(&server);
    let settings = common::settings(KEYWORDS);
    let request = common::request(&settings, DataSources::all());
    let fetched = service.fetch_as_of(&request, common::today()).await.unwrap();
    let requests_after_fetch = server.received_requests().await.unwrap().len();

    let exported = service.export().await.unwrap();
    assert_eq!(*exported, *fetched);
    assert_eq!(server.received_requests().await.unwrap().len(), requests_after_fetch);
    assert!(service.cache().get_matching(&request.fingerprint()).await.is_some());
}

#[tokio::test]
async fn test_identical_fetches_are_identical() {
    let server = MockServer::start().await;
    common::mount_all_sources(&server).await;

    let service = common::service(&server);
    let settings = common::settings(KEYWORDS);
    let request = common::request(&settings, DataSources::all());

    let first = service.fetch_as_of(&request, common::today()).await.unwrap();
    let second = service.fetch_as_of(&request, common::today()).await.unwrap();

    assert_eq!(serde_json::to_string(&*first).unwrap(), serde_json::to_string(&*second).unwrap());
}

#[tokio::test]
async fn test_duplicate_title_keeps_higher_priority_source() {
    let server = MockServer::start().await;
    common::mount_arxiv(
        &server,
        common::atom_feed(&[AtomEntry {
            id: "2403.3v1",
            title: "Plasma   biomarkers of ALZHEIMER'S disease",
            summary: "",
            published: "2024-03-08",
        }]),
    )
    .await;
    common::mount_rxiv_empty(&server).await;
    common::mount_pubmed(
        &server,
        &[PubmedArticle {
            pmid: "10",
            title: "Plasma biomarkers of Alzheimer's disease",
            abstract_text: "",
            journal: "Nature Medicine",
            year: "2024",
            month: "03",
            day: "09",
        }],
    )
    .await;

    let settings = common::settings(KEYWORDS);
    let result = common::service(&server)
        .fetch_as_of(&common::request(&settings, DataSources::all()), common::today())
        .await
        .unwrap();

    assert_eq!(result.total_before_filter, 2);
    assert_eq!(result.total_after_filter, 1);
    assert_eq!(result.papers.len(), 1);
    assert_eq!(result.papers[0].source, Source::Arxiv);
}
