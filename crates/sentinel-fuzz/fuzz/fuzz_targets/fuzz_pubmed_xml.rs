#![no_main]

use libfuzzer_sys::fuzz_target;
use research_digest::sources::parse_pubmed_xml;

fuzz_target!(|data: &[u8]| {
    if let Ok(xml) = std::str::from_utf8(data) {
        if let Ok(papers) = parse_pubmed_xml(xml) {
            // Accepted records always carry a title
            assert!(papers.iter().all(|p| !p.title.is_empty()));
        }
    }
});
