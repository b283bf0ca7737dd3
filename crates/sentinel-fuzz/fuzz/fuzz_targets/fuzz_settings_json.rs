#![no_main]

use libfuzzer_sys::fuzz_target;
use research_digest::Settings;

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        // Validation must reject bad input, never panic
        let _ = Settings::from_json(raw);
    }
});
