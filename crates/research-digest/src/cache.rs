//! Single-slot store for the most recent fetch result.
//!
//! Last write wins. There is no expiry; a new fetch replaces the slot
//! wholesale. Readers get an `Arc` and never observe a half-written result.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::FetchResult;

/// The cached result and the request it answers.
#[derive(Debug, Clone)]
pub struct CachedResult {
    /// Fingerprint of the request that produced the result.
    pub fingerprint: String,
    /// The result itself.
    pub result: Arc<FetchResult>,
}

/// Process-scoped holder of the latest [`FetchResult`].
#[derive(Debug, Clone, Default)]
pub struct ResultCache {
    slot: Arc<RwLock<Option<CachedResult>>>,
}

impl ResultCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot with a new result.
    pub async fn store(&self, fingerprint: String, result: FetchResult) -> Arc<FetchResult> {
        let result = Arc::new(result);
        let entry = CachedResult { fingerprint, result: Arc::clone(&result) };
        *self.slot.write().await = Some(entry);
        result
    }

    /// The most recent entry, if any fetch completed.
    pub async fn latest(&self) -> Option<CachedResult> {
        self.slot.read().await.clone()
    }

    /// The cached result, only if it was produced for `fingerprint`.
    pub async fn get_matching(&self, fingerprint: &str) -> Option<Arc<FetchResult>> {
        let slot = self.slot.read().await;
        slot.as_ref().filter(|c| c.fingerprint == fingerprint).map(|c| Arc::clone(&c.result))
    }
}
