//! Research digest
//!
//! Fetches newly published papers from arXiv, bioRxiv/medRxiv and PubMed,
//! scores them against a keyword profile, classifies their venues, and
//! returns one ranked, deduplicated list.
//!
//! # Pipeline
//!
//! - **Fetch**: every enabled source runs concurrently with its own timeout;
//!   a failing source becomes an entry in [`FetchResult::errors`]
//! - **Score**: keyword matches on title and abstract, weighted by priority tier
//! - **Classify**: journal rules mark high-impact venues and add a boost
//! - **Rank**: dedup by normalized title, sort by score then date, truncate
//! - **Cache**: the latest result stays available for export
//!
//! # Example
//!
//! ```no_run
//! use research_digest::{Config, DigestService, FetchRequest, Settings};
//! use research_digest::models::{DataSources, SearchMode};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let service = DigestService::new(&config)?;
//!
//!     let settings = Settings::default().validated()?;
//!     let request =
//!         FetchRequest::from_settings(&settings, DataSources::all(), SearchMode::Brief, 7);
//!     let result = service.fetch(&request).await?;
//!     println!("{} papers", result.papers.len());
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod formatters;
pub mod journal;
pub mod models;
pub mod orchestrator;
pub mod scoring;
pub mod service;
pub mod settings;
pub mod sources;

pub use cache::ResultCache;
pub use config::Config;
pub use error::{ClientError, DigestError, FetchError, SettingsError};
pub use models::{FetchRequest, FetchResult, Paper, Source};
pub use service::DigestService;
pub use settings::Settings;
