pub mod memory;
pub mod redis;

pub use self::memory::MemoryFacilityCache;
pub use self::redis::RedisFacilityCache;

use crate::models::FacilitySnapshot;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Storage for facility snapshots.
///
/// Entries are retained for the stale window; whether a snapshot is still
/// fresh is decided by the caller from `FacilitySnapshot::fetched_at`.
/// Backend failures are logged and read as misses.
#[async_trait]
pub trait FacilityCache: Send + Sync {
    async fn get_snapshot(&self, key: &str) -> Option<FacilitySnapshot>;
    async fn put_snapshot(&self, key: &str, snapshot: &FacilitySnapshot);
    async fn get_stats(&self) -> CacheStats;
    async fn health_check(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub connected: bool,
}

impl CacheStats {
    pub fn from_counts(hits: u64, misses: u64, connected: bool) -> Self {
        let hit_rate = if hits + misses > 0 {
            (hits as f64 / (hits + misses) as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            hit_rate,
            connected,
        }
    }
}
