//! Data models shared by every pipeline stage.
//!
//! Fetchers produce [`Paper`]s, the scorer and journal classifier enrich
//! them, and the aggregator packs them into a [`FetchResult`].

mod paper;
mod request;
mod result;

pub use paper::{Paper, Source, normalize_title};
pub use request::{DataSources, FetchRequest, SearchMode};
pub use result::FetchResult;
