//! Shared HTTP client for every bibliographic source.
//!
//! Provides async HTTP access with:
//! - Connection pooling via reqwest
//! - Per-source politeness delay before each request
//! - Response caching with a short TTL
//! - Uniform mapping of HTTP status codes to [`ClientError`]
//!
//! No retry layer: one attempt per fetch, failures surface as errors in the
//! fetch result.

use std::time::Duration;

use moka::future::Cache;
use reqwest::Client;

use crate::config::{Config, api};
use crate::error::{ClientError, ClientResult};

/// HTTP client shared by the source fetchers.
#[derive(Clone)]
pub struct HttpClient {
    /// Pooled HTTP client.
    client: Client,

    /// Response body cache.
    cache: Cache<String, String>,

    /// Request timeout, reported back on timeouts.
    request_timeout: Duration,
}

impl HttpClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("research-digest/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(api::MAX_KEEPALIVE)
            .pool_idle_timeout(api::KEEPALIVE_EXPIRY)
            .gzip(true)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(config.cache_max_size)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self { client, cache, request_timeout: config.request_timeout })
    }

    /// GET a URL and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, non-success status, or invalid JSON.
    pub async fn get_json<T>(
        &self,
        url: &str,
        params: &[(String, String)],
        delay: Duration,
    ) -> ClientResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = self.get_text(url, params, delay).await?;
        serde_json::from_str(&body).map_err(ClientError::from)
    }

    /// GET a URL and return the body as text.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or non-success status.
    pub async fn get_text(
        &self,
        url: &str,
        params: &[(String, String)],
        delay: Duration,
    ) -> ClientResult<String> {
        // Check cache
        let cache_key = cache_key("GET", url, params);
        if let Some(cached) = self.cache.get(&cache_key).await {
            tracing::debug!(url = %url, "Response served from cache");
            return Ok(cached);
        }

        // Politeness delay
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let response =
            self.client.get(url).query(params).send().await.map_err(|e| self.transport(e))?;
        let response = handle_response(response).await?;
        let body = response.text().await.map_err(|e| self.transport(e))?;

        // Cache response
        self.cache.insert(cache_key, body.clone()).await;

        Ok(body)
    }

    /// Map a transport error, keeping timeouts distinct.
    fn transport(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() { ClientError::Timeout(self.request_timeout) } else { err.into() }
    }
}

/// Handle API response status codes.
async fn handle_response(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        429 => {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);

            Err(ClientError::rate_limited(retry_after))
        }
        404 => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::not_found(truncate(&text)))
        }
        400 => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::bad_request(truncate(&text)))
        }
        500..=599 => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::server(status.as_u16(), truncate(&text)))
        }
        _ => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::UnexpectedStatus { status: status.as_u16(), message: truncate(&text) })
        }
    }
}

/// Keep error bodies short enough for a one-line error string.
fn truncate(text: &str) -> String {
    const MAX: usize = 200;
    let text = text.trim();
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

/// Generate cache key.
fn cache_key(method: &str, url: &str, params: &[(String, String)]) -> String {
    use md5::{Digest, Md5};

    let mut hasher = Md5::new();
    hasher.update(method.as_bytes());
    hasher.update(b"|");
    hasher.update(url.as_bytes());
    hasher.update(b"|");

    for (k, v) in params {
        hasher.update(k.as_bytes());
        hasher.update(b"=");
        hasher.update(v.as_bytes());
        hasher.update(b"&");
    }

    format!("{:x}", hasher.finalize())
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient").field("cached_entries", &self.cache.entry_count()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_depends_on_params() {
        let a = cache_key("GET", "http://x/api", &[("q".into(), "tau".into())]);
        let b = cache_key("GET", "http://x/api", &[("q".into(), "amyloid".into())]);
        let c = cache_key("GET", "http://x/api", &[("q".into(), "tau".into())]);
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_truncate_long_bodies() {
        let long = "x".repeat(500);
        let short = truncate(&long);
        assert!(short.chars().count() <= 201);
        assert!(short.ends_with('…'));
        assert_eq!(truncate("  ok "), "ok");
    }

    #[test]
    fn test_client_creation_succeeds() {
        let client = HttpClient::new(&Config::for_testing("http://127.0.0.1:1"));
        assert!(client.is_ok());
    }
}
