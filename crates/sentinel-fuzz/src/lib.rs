//! Fuzzing library for research-digest.
//!
//! This crate provides fuzzing targets for the source record parsers
//! (arXiv Atom, PubMed XML, bioRxiv details JSON) and settings JSON.
//!
//! # Usage
//!
//! ```bash
//! cd crates/sentinel-fuzz
//! cargo +nightly fuzz run fuzz_pubmed_xml -- -max_total_time=60
//! ```

pub use research_digest::sources;
