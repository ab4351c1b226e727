//! Cached access to the expiry threshold settings.
//!
//! Thresholds are read for every list, alert and export request, so the
//! parsed settings are kept in memory. Writes go through
//! [`ThresholdCache::save`], which hands back a [`CacheInvalidation`] the
//! caller applies once the write is committed.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::setting::ThresholdSettings;

#[derive(Debug, Error)]
pub enum ThresholdStoreError {
    #[error("Threshold store unavailable: {0}")]
    Unavailable(String),
}

/// Backing store for the raw settings blob.
#[async_trait]
pub trait ThresholdStore: Send + Sync {
    /// Stored blob, or `None` if the key was never written.
    async fn load_thresholds(&self) -> Result<Option<JsonValue>, ThresholdStoreError>;

    async fn save_thresholds(
        &self,
        value: &JsonValue,
        updated_by: Option<Uuid>,
    ) -> Result<(), ThresholdStoreError>;
}

struct Cached {
    settings: ThresholdSettings,
    fetched_at: Instant,
}

#[derive(Clone)]
pub struct ThresholdCache {
    store: Arc<dyn ThresholdStore>,
    state: Arc<RwLock<Option<Cached>>>,
    // bumped on every invalidation so an in-flight load cannot repopulate stale data
    generation: Arc<AtomicU64>,
    ttl: Option<Duration>,
}

impl std::fmt::Debug for ThresholdCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThresholdCache")
            .field("ttl", &self.ttl)
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish()
    }
}

impl ThresholdCache {
    /// `ttl = None` keeps entries until explicitly invalidated.
    pub fn new(store: Arc<dyn ThresholdStore>, ttl: Option<Duration>) -> Self {
        Self {
            store,
            state: Arc::new(RwLock::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
            ttl,
        }
    }

    fn is_fresh(&self, cached: &Cached) -> bool {
        self.ttl
            .map_or(true, |ttl| cached.fetched_at.elapsed() < ttl)
    }

    /// Current thresholds, loading from the store on a miss.
    pub async fn get(&self) -> Result<ThresholdSettings, ThresholdStoreError> {
        {
            let state = self.state.read().await;
            if let Some(cached) = state.as_ref() {
                if self.is_fresh(cached) {
                    return Ok(cached.settings.clone());
                }
            }
        }

        let generation = self.generation.load(Ordering::Acquire);
        let settings = match self.store.load_thresholds().await? {
            Some(value) => ThresholdSettings::from_flat_json(&value),
            None => ThresholdSettings::default(),
        };

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::Acquire) == generation {
            *state = Some(Cached {
                settings: settings.clone(),
                fetched_at: Instant::now(),
            });
            debug!("Threshold settings cached");
        }
        Ok(settings)
    }

    /// Drops the cached value; the next `get` reloads.
    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        *self.state.write().await = None;
        debug!("Threshold settings cache invalidated");
    }

    /// Persists new thresholds. The returned invalidation must be applied
    /// for this process to observe the write.
    pub async fn save(
        &self,
        settings: &ThresholdSettings,
        updated_by: Option<Uuid>,
    ) -> Result<CacheInvalidation, ThresholdStoreError> {
        self.store
            .save_thresholds(&settings.to_flat_json(), updated_by)
            .await?;
        Ok(CacheInvalidation {
            cache: self.clone(),
        })
    }
}

/// Pending invalidation produced by a successful save.
#[must_use = "call apply() after the write is committed"]
pub struct CacheInvalidation {
    cache: ThresholdCache,
}

impl CacheInvalidation {
    pub async fn apply(self) {
        self.cache.invalidate().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::expiry::{DocumentType, ExpiryThresholds};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        value: Mutex<Option<JsonValue>>,
        loads: AtomicU64,
        fail: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl ThresholdStore for MemoryStore {
        async fn load_thresholds(&self) -> Result<Option<JsonValue>, ThresholdStoreError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(ThresholdStoreError::Unavailable("down".into()));
            }
            Ok(self.value.lock().unwrap().clone())
        }

        async fn save_thresholds(
            &self,
            value: &JsonValue,
            _updated_by: Option<Uuid>,
        ) -> Result<(), ThresholdStoreError> {
            *self.value.lock().unwrap() = Some(value.clone());
            Ok(())
        }
    }

    fn setup(ttl: Option<Duration>) -> (Arc<MemoryStore>, ThresholdCache) {
        let store = Arc::new(MemoryStore::default());
        let cache = ThresholdCache::new(store.clone(), ttl);
        (store, cache)
    }

    #[tokio::test]
    async fn test_missing_key_yields_defaults() {
        let (_, cache) = setup(None);
        assert_eq!(cache.get().await.unwrap(), ThresholdSettings::default());
    }

    #[tokio::test]
    async fn test_hit_does_not_reload() {
        let (store, cache) = setup(None);
        cache.get().await.unwrap();
        cache.get().await.unwrap();
        cache.get().await.unwrap();
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_external_write_invisible_until_invalidated() {
        let (store, cache) = setup(None);
        cache.get().await.unwrap();

        *store.value.lock().unwrap() = Some(json!({"residence_urgent_days": 1}));
        assert_eq!(
            cache.get().await.unwrap().get(DocumentType::Residence).urgent_days,
            7
        );

        cache.invalidate().await;
        assert_eq!(
            cache.get().await.unwrap().get(DocumentType::Residence).urgent_days,
            1
        );
    }

    #[tokio::test]
    async fn test_save_then_apply() {
        let (store, cache) = setup(None);
        cache.get().await.unwrap();

        let mut next = ThresholdSettings::default();
        next.set(DocumentType::Contract, ExpiryThresholds::new(3, 6, 9));
        let invalidation = cache.save(&next, None).await.unwrap();

        // not applied yet: still the cached defaults
        assert_eq!(cache.get().await.unwrap(), ThresholdSettings::default());

        invalidation.apply().await;
        assert_eq!(cache.get().await.unwrap(), next);
        assert_eq!(store.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_reloads() {
        let (store, cache) = setup(Some(Duration::ZERO));
        cache.get().await.unwrap();
        cache.get().await.unwrap();
        assert_eq!(store.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_store_failure_propagates_and_leaves_cache_empty() {
        let (store, cache) = setup(None);
        store.fail.store(true, Ordering::SeqCst);
        assert!(cache.get().await.is_err());

        store.fail.store(false, Ordering::SeqCst);
        assert!(cache.get().await.is_ok());
        assert_eq!(store.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let (store, cache) = setup(None);
        let other = cache.clone();
        cache.get().await.unwrap();
        other.get().await.unwrap();
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);

        other.invalidate().await;
        cache.get().await.unwrap();
        assert_eq!(store.loads.load(Ordering::SeqCst), 2);
    }
}
