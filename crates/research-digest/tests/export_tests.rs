//! Export of a cached fetch result in every format.

mod common;

use wiremock::MockServer;

use research_digest::export::{ExportFormat, render};
use research_digest::models::DataSources;

#[tokio::test]
async fn test_every_format_renders_the_cached_result() {
    let server = MockServer::start().await;
    common::mount_all_sources(&server).await;

    let service = common::service(&server);
    let settings = common::settings(&["Alzheimer's disease", "amyloid", "tau", "PET"]);
    service
        .fetch_as_of(&common::request(&settings, DataSources::all()), common::today())
        .await
        .unwrap();
    let cached = service.export().await.unwrap();
    assert_eq!(cached.papers.len(), 3);

    let csv = render(&cached, ExportFormat::Csv);
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.contains("Nature Medicine,12,1,"));

    let ris = render(&cached, ExportFormat::Ris);
    assert_eq!(ris.matches("ER  - ").count(), 3);
    assert!(ris.contains("JO  - Nature Medicine"));

    let bib = render(&cached, ExportFormat::Bibtex);
    assert_eq!(bib.matches("\n@").count() + usize::from(bib.starts_with('@')), 3);
    assert!(bib.contains("journal = {Nature Medicine}"));

    let enw = render(&cached, ExportFormat::Endnote);
    assert_eq!(enw.matches("%0 ").count(), 3);

    let md = render(&cached, ExportFormat::Markdown);
    assert!(md.contains("## 1. "));
    assert!(md.contains("★"));

    let json: serde_json::Value = serde_json::from_str(&render(&cached, ExportFormat::Json)).unwrap();
    assert_eq!(json["papers"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_pubmed_paper_is_high_impact_and_ranked_first() {
    let server = MockServer::start().await;
    common::mount_all_sources(&server).await;

    let service = common::service(&server);
    let settings = common::settings(&["Alzheimer's disease", "amyloid", "tau", "PET"]);
    let result = service
        .fetch_as_of(&common::request(&settings, DataSources::all()), common::today())
        .await
        .unwrap();

    let top = &result.papers[0];
    assert_eq!(top.journal, "Nature Medicine");
    assert!(top.is_high_impact);
    assert_eq!(top.volume, "12");
}
