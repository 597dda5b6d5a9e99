use crate::cache::{CacheStats, FacilityCache};
use crate::models::FacilitySnapshot;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-process snapshot cache on moka. Lost on restart.
pub struct MemoryFacilityCache {
    snapshots: Cache<String, Arc<FacilitySnapshot>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryFacilityCache {
    /// `retention_seconds` is how long a snapshot survives, fresh or stale
    pub fn new(retention_seconds: u64, max_capacity: u64) -> Self {
        let snapshots = Cache::builder()
            .time_to_live(Duration::from_secs(retention_seconds))
            .max_capacity(max_capacity)
            .build();

        MemoryFacilityCache {
            snapshots,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl FacilityCache for MemoryFacilityCache {
    async fn get_snapshot(&self, key: &str) -> Option<FacilitySnapshot> {
        match self.snapshots.get(key).await {
            Some(snapshot) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Memory cache hit: {}", key);
                Some((*snapshot).clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Memory cache miss: {}", key);
                None
            }
        }
    }

    async fn put_snapshot(&self, key: &str, snapshot: &FacilitySnapshot) {
        self.snapshots
            .insert(key.to_string(), Arc::new(snapshot.clone()))
            .await;
        tracing::debug!("Memory cached {} facilities: {}", snapshot.facilities.len(), key);
    }

    async fn get_stats(&self) -> CacheStats {
        CacheStats::from_counts(
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            true,
        )
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
