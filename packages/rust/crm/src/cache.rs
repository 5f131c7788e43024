//! Short-TTL in-process catalog cache.
//!
//! Wraps any [`CatalogSource`]. Only successful fetches are cached, keyed by
//! location id; an expired or missing entry triggers exactly one fetch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use leadbridge_shared::{CrmCredentials, ExternalFieldDefinition, Result};
use tokio::sync::RwLock;
use tracing::debug;

use crate::CatalogSource;

struct CachedCatalog {
    fetched_at: Instant,
    fields: Arc<Vec<ExternalFieldDefinition>>,
}

/// Caching decorator over a catalog source.
pub struct CatalogCache<S> {
    source: S,
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedCatalog>>,
}

impl<S: CatalogSource> CatalogCache<S> {
    /// Wrap `source`, reusing catalogs for `ttl`. A zero TTL disables caching.
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Drop the cached catalog for one location.
    pub async fn invalidate(&self, location_id: &str) {
        self.entries.write().await.remove(location_id);
    }

    /// The wrapped source.
    pub fn inner(&self) -> &S {
        &self.source
    }

    async fn lookup(&self, location_id: &str) -> Option<Arc<Vec<ExternalFieldDefinition>>> {
        let entries = self.entries.read().await;
        entries
            .get(location_id)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.fields))
    }
}

impl<S: CatalogSource> CatalogSource for CatalogCache<S> {
    async fn fetch_catalog(&self, creds: &CrmCredentials) -> Result<Vec<ExternalFieldDefinition>> {
        if self.ttl.is_zero() {
            return self.source.fetch_catalog(creds).await;
        }

        if let Some(fields) = self.lookup(&creds.location_id).await {
            debug!(location = %creds.location_id, "catalog cache hit");
            return Ok(fields.as_ref().clone());
        }

        let fields = self.source.fetch_catalog(creds).await?;
        self.entries.write().await.insert(
            creds.location_id.clone(),
            CachedCatalog {
                fetched_at: Instant::now(),
                fields: Arc::new(fields.clone()),
            },
        );
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadbridge_shared::{FieldDataType, LeadBridgeError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl CatalogSource for CountingSource {
        async fn fetch_catalog(
            &self,
            _creds: &CrmCredentials,
        ) -> Result<Vec<ExternalFieldDefinition>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LeadBridgeError::CatalogUnavailable("down".into()));
            }
            Ok(vec![ExternalFieldDefinition {
                id: "f1".into(),
                display_name: "Notes".into(),
                key: None,
                data_type: FieldDataType::LongText,
            }])
        }
    }

    fn creds(location: &str) -> CrmCredentials {
        CrmCredentials {
            base_url: "http://localhost".into(),
            location_id: location.into(),
            token: "t".into(),
            api_version: "2021-07-28".into(),
        }
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let cache = CatalogCache::new(CountingSource::new(false), Duration::from_secs(300));
        cache.fetch_catalog(&creds("loc_a")).await.unwrap();
        let fields = cache.fetch_catalog(&creds("loc_a")).await.unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn locations_are_cached_separately() {
        let cache = CatalogCache::new(CountingSource::new(false), Duration::from_secs(300));
        cache.fetch_catalog(&creds("loc_a")).await.unwrap();
        cache.fetch_catalog(&creds("loc_b")).await.unwrap();
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_ttl_disables_cache() {
        let cache = CatalogCache::new(CountingSource::new(false), Duration::ZERO);
        cache.fetch_catalog(&creds("loc_a")).await.unwrap();
        cache.fetch_catalog(&creds("loc_a")).await.unwrap();
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = CatalogCache::new(CountingSource::new(true), Duration::from_secs(300));
        assert!(cache.fetch_catalog(&creds("loc_a")).await.is_err());
        assert!(cache.fetch_catalog(&creds("loc_a")).await.is_err());
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cache = CatalogCache::new(CountingSource::new(false), Duration::from_secs(300));
        cache.fetch_catalog(&creds("loc_a")).await.unwrap();
        cache.invalidate("loc_a").await;
        cache.fetch_catalog(&creds("loc_a")).await.unwrap();
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
    }
}
