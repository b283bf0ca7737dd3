#![no_main]

use libfuzzer_sys::fuzz_target;
use research_digest::sources::parse_feed;

fuzz_target!(|data: &[u8]| {
    // Should never panic, only return Ok or Err
    if let Ok(xml) = std::str::from_utf8(data) {
        let _ = parse_feed(xml);
    }
});
