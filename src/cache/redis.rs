use crate::cache::{CacheStats, FacilityCache};
use crate::error::{AppError, Result};
use crate::models::FacilitySnapshot;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Redis-backed snapshot cache, shared across instances and restarts.
/// `ConnectionManager` clones share one multiplexed connection.
pub struct RedisFacilityCache {
    connection: ConnectionManager,
    retention_seconds: u64,
}

impl RedisFacilityCache {
    pub async fn new(redis_url: &str, retention_seconds: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Cache(format!("Failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Cache(format!("Failed to connect to Redis: {}", e)))?;

        tracing::info!("Redis cache connection established");

        Ok(RedisFacilityCache {
            connection,
            retention_seconds,
        })
    }
}

#[async_trait]
impl FacilityCache for RedisFacilityCache {
    async fn get_snapshot(&self, key: &str) -> Option<FacilitySnapshot> {
        let mut conn = self.connection.clone();
        let result: redis::RedisResult<Option<String>> = conn.get(key).await;

        match result {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(snapshot) => {
                    tracing::debug!("Redis cache hit: {}", key);
                    Some(snapshot)
                }
                Err(e) => {
                    tracing::warn!("Failed to deserialize cached facilities: {}", e);
                    None
                }
            },
            Ok(None) => {
                tracing::debug!("Redis cache miss: {}", key);
                None
            }
            Err(e) => {
                tracing::warn!("Redis error reading {}: {}", key, e);
                None
            }
        }
    }

    async fn put_snapshot(&self, key: &str, snapshot: &FacilitySnapshot) {
        let json = match serde_json::to_string(snapshot) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("Failed to serialize facilities for cache: {}", e);
                return;
            }
        };

        let mut conn = self.connection.clone();
        let result: redis::RedisResult<()> = conn.set_ex(key, json, self.retention_seconds).await;

        match result {
            Ok(()) => tracing::debug!(
                "Cached {} facilities for {}s: {}",
                snapshot.facilities.len(),
                self.retention_seconds,
                key
            ),
            Err(e) => tracing::warn!("Failed to cache facilities: {}", e),
        }
    }

    async fn get_stats(&self) -> CacheStats {
        let mut conn = self.connection.clone();
        let info: redis::RedisResult<String> =
            redis::cmd("INFO").arg("stats").query_async(&mut conn).await;

        match info {
            Ok(info) => CacheStats::from_counts(
                parse_info_value(&info, "keyspace_hits"),
                parse_info_value(&info, "keyspace_misses"),
                true,
            ),
            Err(_) => CacheStats::from_counts(0, 0, false),
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.connection.clone();
        let result: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        result.is_ok()
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

fn parse_info_value(info: &str, key: &str) -> u64 {
    info.lines()
        .find_map(|line| line.strip_prefix(key)?.strip_prefix(':'))
        .and_then(|val| val.trim().parse().ok())
        .unwrap_or(0)
}
