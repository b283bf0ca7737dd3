//! Runtime configuration: endpoints, timeouts, politeness delays, caching.
//!
//! Research interests (keywords, journals, scoring) live in
//! [`Settings`](crate::settings::Settings); this module only covers how the
//! process talks to the outside world.

use std::time::Duration;

/// API configuration constants.
pub mod api {
    use std::time::Duration;

    /// arXiv Atom query endpoint.
    pub const ARXIV_API: &str = "https://export.arxiv.org/api/query";

    /// bioRxiv/medRxiv details API root (server name is appended per request).
    pub const RXIV_API: &str = "https://api.biorxiv.org";

    /// NCBI E-utilities root.
    pub const EUTILS_API: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

    /// Tool name reported to NCBI.
    pub const NCBI_TOOL: &str = "research-digest";

    /// HTTP request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Upper bound for one source fetch, all pages included.
    pub const SOURCE_TIMEOUT: Duration = Duration::from_secs(60);

    /// arXiv asks for one request every 3 seconds.
    pub const ARXIV_DELAY: Duration = Duration::from_secs(3);

    /// bioRxiv has no published limit; stay polite.
    pub const RXIV_DELAY: Duration = Duration::from_millis(500);

    /// NCBI: 3 req/s without an API key.
    pub const PUBMED_DELAY: Duration = Duration::from_millis(350);

    /// NCBI: 10 req/s with an API key.
    pub const PUBMED_DELAY_WITH_KEY: Duration = Duration::from_millis(110);

    /// Response cache TTL (5 minutes).
    pub const CACHE_TTL: Duration = Duration::from_secs(300);

    /// Maximum cached responses.
    pub const CACHE_MAX_SIZE: u64 = 200;

    /// Upper bound on concurrently running source fetchers.
    pub const MAX_WORKERS: usize = 4;

    /// Maximum keepalive connections.
    pub const MAX_KEEPALIVE: usize = 10;

    /// Keepalive expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// arXiv query endpoint.
    pub arxiv_api_url: String,

    /// bioRxiv/medRxiv API root.
    pub rxiv_api_url: String,

    /// NCBI E-utilities root.
    pub eutils_api_url: String,

    /// NCBI API key (optional, raises the PubMed rate limit).
    pub ncbi_api_key: Option<String>,

    /// Contact email reported to NCBI (optional).
    pub ncbi_email: Option<String>,

    /// HTTP request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Time budget for one source fetch.
    pub source_timeout: Duration,

    /// Delay before each arXiv request.
    pub arxiv_delay: Duration,

    /// Delay before each bioRxiv/medRxiv request.
    pub rxiv_delay: Duration,

    /// Delay before each E-utilities request.
    pub pubmed_delay: Duration,

    /// Response cache TTL.
    pub cache_ttl: Duration,

    /// Maximum cache size.
    pub cache_max_size: u64,

    /// Worker cap for the fetch orchestrator.
    pub max_workers: usize,
}

impl Config {
    /// Create a new configuration with optional NCBI credentials.
    ///
    /// The PubMed delay follows NCBI's published limits:
    /// - Without key: 3 req/s
    /// - With key: 10 req/s
    #[must_use]
    pub fn new(ncbi_api_key: Option<String>, ncbi_email: Option<String>) -> Self {
        let has_key = ncbi_api_key.is_some();
        Self {
            arxiv_api_url: api::ARXIV_API.to_string(),
            rxiv_api_url: api::RXIV_API.to_string(),
            eutils_api_url: api::EUTILS_API.to_string(),
            ncbi_api_key,
            ncbi_email,
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            source_timeout: api::SOURCE_TIMEOUT,
            arxiv_delay: api::ARXIV_DELAY,
            rxiv_delay: api::RXIV_DELAY,
            pubmed_delay: if has_key { api::PUBMED_DELAY_WITH_KEY } else { api::PUBMED_DELAY },
            cache_ttl: api::CACHE_TTL,
            cache_max_size: api::CACHE_MAX_SIZE,
            max_workers: api::MAX_WORKERS,
        }
    }

    /// Create a test configuration with every source pointed at a mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            arxiv_api_url: format!("{}/arxiv/api/query", base_url),
            rxiv_api_url: format!("{}/rxiv", base_url),
            eutils_api_url: format!("{}/eutils", base_url),
            ncbi_api_key: None,
            ncbi_email: None,
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            source_timeout: Duration::from_secs(10),
            arxiv_delay: Duration::from_millis(0), // No delay in tests
            rxiv_delay: Duration::from_millis(0),
            pubmed_delay: Duration::from_millis(0),
            cache_ttl: Duration::from_secs(0), // No caching in tests
            cache_max_size: 0,
            max_workers: api::MAX_WORKERS,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `NCBI_API_KEY`, `NCBI_EMAIL` and `RESEARCH_DIGEST_SOURCE_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns error if environment variables are invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("NCBI_API_KEY").ok().filter(|k| !k.trim().is_empty());
        let email = std::env::var("NCBI_EMAIL").ok().filter(|e| !e.trim().is_empty());
        let mut config = Self::new(api_key, email);

        if let Ok(secs) = std::env::var("RESEARCH_DIGEST_SOURCE_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                anyhow::anyhow!("RESEARCH_DIGEST_SOURCE_TIMEOUT_SECS must be an integer: {e}")
            })?;
            anyhow::ensure!(secs > 0, "RESEARCH_DIGEST_SOURCE_TIMEOUT_SECS must be positive");
            config.source_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Check if an NCBI API key is configured.
    #[must_use]
    pub const fn has_ncbi_api_key(&self) -> bool {
        self.ncbi_api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None, None)
    }
}
