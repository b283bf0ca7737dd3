#![no_main]

use libfuzzer_sys::fuzz_target;
use research_digest::settings::RxivServer;
use research_digest::sources::parse_details;

fuzz_target!(|data: &[u8]| {
    if let Ok(body) = std::str::from_utf8(data) {
        let _ = parse_details(body, RxivServer::Biorxiv);
    }
});
