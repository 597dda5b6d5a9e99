//! Stable application-wide constants.
//!
//! Values here are structural invariants, scoring tables, and default
//! fallbacks for env-var-based configuration. Runtime-tunable knobs live in
//! [`RiskConfig`](crate::config::RiskConfig) and
//! [`DispatcherConfig`](crate::config::DispatcherConfig).

// --- Server defaults (used when HOST / PORT env vars are absent) ---

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the HTTP server.
pub const DEFAULT_PORT: &str = "3000";

// --- Safety score table ---
// Every sampled point contributes one of these weights; the route safety
// score is their arithmetic mean, so it always lies in [20, 100].

pub const SAFETY_WEIGHT_LOW: f64 = 100.0;
pub const SAFETY_WEIGHT_LOW_MEDIUM: f64 = 80.0;
pub const SAFETY_WEIGHT_MEDIUM: f64 = 60.0;
pub const SAFETY_WEIGHT_MEDIUM_HIGH: f64 = 40.0;
pub const SAFETY_WEIGHT_HIGH: f64 = 20.0;

/// Score reported for a route with no sampled points.
pub const EMPTY_ROUTE_SAFETY_SCORE: f64 = 100.0;

// --- Overall risk thresholds (inclusive lower bounds on the safety score) ---

pub const OVERALL_LOW_MIN_SCORE: f64 = 80.0;
pub const OVERALL_LOW_MEDIUM_MIN_SCORE: f64 = 65.0;
pub const OVERALL_MEDIUM_MIN_SCORE: f64 = 50.0;
pub const OVERALL_MEDIUM_HIGH_MIN_SCORE: f64 = 35.0;

/// Upper bound on the canned recommendation list.
pub const MAX_ROUTE_RECOMMENDATIONS: usize = 4;

// --- Crime count -> risk level buckets (inclusive lower bounds) ---

pub const CRIME_COUNT_LOW_MEDIUM_MIN: i64 = 1;
pub const CRIME_COUNT_MEDIUM_MIN: i64 = 3;
pub const CRIME_COUNT_MEDIUM_HIGH_MIN: i64 = 6;
pub const CRIME_COUNT_HIGH_MIN: i64 = 10;

// --- Route sampling ---

/// Spacing (meters) between samples drawn along a routed polyline.
pub const DEFAULT_SAMPLE_INTERVAL_METERS: f64 = 100.0;
/// Hard cap on samples per route; the interval widens to respect it.
pub const MAX_ROUTE_SAMPLES: usize = 100;
/// Largest coordinate list accepted by the route assessment endpoint.
pub const MAX_ASSESSMENT_COORDINATES: usize = 500;

// --- Crime density lookup defaults (used when env vars are absent) ---

/// Radius (meters) of the grid cell counted around each sampled point.
pub const DEFAULT_RISK_CELL_RADIUS_METERS: f64 = 250.0;
/// Hours on either side of the requested hour counted as "same time of day".
pub const DEFAULT_RISK_HOUR_WINDOW: u8 = 1;
/// Row cap on the incident fetch backing a single lookup.
pub const MAX_INCIDENTS_PER_LOOKUP: i64 = 20_000;

// --- Facilities ---

/// Facilities stay fresh for 24 hours. Overridden by `FACILITY_CACHE_TTL`.
pub const DEFAULT_FACILITY_CACHE_TTL_SECONDS: u64 = 86_400;
/// Expired facility data is kept this long as a stale fallback (7 days).
pub const FACILITY_STALE_RETENTION_SECONDS: u64 = 604_800;
/// In-memory facility cache capacity
pub const FACILITY_MEMORY_CACHE_MAX_ENTRIES: u64 = 16;
/// Single cache slot: the municipality's facility list.
pub const FACILITY_CACHE_KEY: &str = "facilities:municipality";
/// Default municipality bounds as `south,west,north,east`.
pub const DEFAULT_FACILITY_BOUNDS: &str = "14.30,120.98,14.42,121.08";

// --- Overpass API ---

/// Server-side timeout declared inside the Overpass QL query (seconds).
pub const OVERPASS_QUERY_TIMEOUT_SECONDS: u64 = 25;
/// Client-side HTTP timeout for one Overpass request (seconds).
pub const OVERPASS_HTTP_TIMEOUT_SECONDS: u64 = 30;
/// Retries after the first attempt; each retry moves to the next mirror.
pub const OVERPASS_MAX_RETRIES: usize = 1;
pub const OVERPASS_HTTP_TOO_MANY_REQUESTS: u16 = 429;
pub const OVERPASS_HTTP_GATEWAY_TIMEOUT: u16 = 504;

// --- Outbox dispatcher defaults ---

/// Seconds between due-job sweeps. Overridden by `OUTBOX_SWEEP_INTERVAL`.
pub const DEFAULT_OUTBOX_SWEEP_INTERVAL_SECONDS: u64 = 30;
/// Jobs claimed per table per sweep.
pub const DEFAULT_OUTBOX_BATCH_SIZE: i64 = 50;
/// Attempts before a job is marked `failed` for good.
pub const DEFAULT_OUTBOX_MAX_ATTEMPTS: i32 = 3;
/// A job left in `sending` longer than this is claimable again.
pub const DEFAULT_OUTBOX_LEASE_SECONDS: u64 = 300;
/// First retry delay; doubles per attempt.
pub const OUTBOX_RETRY_BASE_DELAY_SECONDS: i64 = 60;
/// Concurrent email sends within one sweep.
pub const OUTBOX_EMAIL_CONCURRENCY: usize = 4;
/// Expo accepts at most 100 messages per request.
pub const EXPO_MAX_MESSAGES_PER_REQUEST: usize = 100;

pub const DEFAULT_EMAIL_FROM: &str = "Bantay Alerts <alerts@bantay.local>";
