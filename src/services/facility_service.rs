use crate::cache::FacilityCache;
use crate::constants::{FACILITY_CACHE_KEY, FACILITY_STALE_RETENTION_SECONDS};
use crate::error::Result;
use crate::models::{BoundingBox, FacilitiesResponse, FacilitySnapshot};
use crate::services::overpass::FacilitySource;
use std::sync::Arc;
use time::OffsetDateTime;

/// Municipality facility list with a fresh TTL and a stale fallback
pub struct FacilityService {
    source: Arc<dyn FacilitySource>,
    cache: Arc<dyn FacilityCache>,
    bounds: BoundingBox,
    fresh_ttl_seconds: u64,
}

impl FacilityService {
    pub fn new(
        source: Arc<dyn FacilitySource>,
        cache: Arc<dyn FacilityCache>,
        bounds: BoundingBox,
        fresh_ttl_seconds: u64,
    ) -> Self {
        FacilityService {
            source,
            cache,
            bounds,
            fresh_ttl_seconds,
        }
    }

    pub fn cache(&self) -> &Arc<dyn FacilityCache> {
        &self.cache
    }

    /// Fresh cache, else a new fetch, else the stale snapshot.
    /// Errors only when the upstream fails with nothing usable cached.
    pub async fn get(&self) -> Result<FacilitiesResponse> {
        let now = OffsetDateTime::now_utc();
        let cached = self.cache.get_snapshot(FACILITY_CACHE_KEY).await;

        if let Some(snapshot) = &cached {
            if snapshot.age_seconds(now) < self.fresh_ttl_seconds as i64 {
                return Ok(FacilitiesResponse::from_snapshot(snapshot.clone(), false));
            }
        }

        match self.source.fetch_facilities(&self.bounds).await {
            Ok(facilities) => {
                let snapshot = FacilitySnapshot::new(facilities, self.bounds);
                self.cache.put_snapshot(FACILITY_CACHE_KEY, &snapshot).await;
                Ok(FacilitiesResponse::from_snapshot(snapshot, false))
            }
            Err(e) => {
                let stale = cached.filter(|s| {
                    s.age_seconds(now) < FACILITY_STALE_RETENTION_SECONDS as i64
                });
                match stale {
                    Some(snapshot) => {
                        tracing::warn!(
                            age_seconds = snapshot.age_seconds(now),
                            "Facility fetch failed, serving stale snapshot: {}",
                            e
                        );
                        Ok(FacilitiesResponse::from_snapshot(snapshot, true))
                    }
                    None => Err(e),
                }
            }
        }
    }
}
