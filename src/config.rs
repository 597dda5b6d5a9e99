use crate::constants::*;
use crate::models::BoundingBox;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Facility cache goes to Redis when set, memory otherwise
    pub redis_url: Option<String>,
    pub mapbox_api_key: String,
    /// Directions base URL override (e.g. a proxy)
    pub mapbox_base_url: Option<String>,
    pub resend_api_key: Option<String>,
    pub email_from: String,
    pub expo_access_token: Option<String>,
    pub facility_cache_ttl: u64,
    /// Municipality bounds used for the facilities query
    pub facility_bounds: BoundingBox,
    pub risk: RiskConfig,
    pub dispatcher: DispatcherConfig,
}

#[derive(Debug, Clone)]
pub struct RiskConfig {
    /// Radius (meters) counted around each sampled point
    pub cell_radius_m: f64,
    /// +/- hours matched when a time of day is requested
    pub hour_window: u8,
    /// IANA zone used to extract hour/day/month from incident timestamps
    pub timezone: String,
    /// Spacing (meters) between samples along a routed polyline
    pub sample_interval_m: f64,
    /// Cap on samples per routed polyline
    pub max_samples: usize,
    /// Incidents a single lookup may count; more fails the lookup
    pub max_incidents: i64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            cell_radius_m: DEFAULT_RISK_CELL_RADIUS_METERS,
            hour_window: DEFAULT_RISK_HOUR_WINDOW,
            timezone: "Asia/Manila".to_string(),
            sample_interval_m: DEFAULT_SAMPLE_INTERVAL_METERS,
            max_samples: MAX_ROUTE_SAMPLES,
            max_incidents: MAX_INCIDENTS_PER_LOOKUP,
        }
    }
}

impl RiskConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let config = Self {
            cell_radius_m: env::var("RISK_CELL_RADIUS_M")
                .unwrap_or_else(|_| defaults.cell_radius_m.to_string())
                .parse()
                .map_err(|_| "Invalid RISK_CELL_RADIUS_M")?,

            hour_window: env::var("RISK_HOUR_WINDOW")
                .unwrap_or_else(|_| defaults.hour_window.to_string())
                .parse()
                .map_err(|_| "Invalid RISK_HOUR_WINDOW")?,

            timezone: env::var("RISK_TIMEZONE").unwrap_or(defaults.timezone),

            sample_interval_m: env::var("ROUTE_SAMPLE_INTERVAL_M")
                .unwrap_or_else(|_| defaults.sample_interval_m.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_SAMPLE_INTERVAL_M")?,

            max_samples: env::var("ROUTE_MAX_SAMPLES")
                .unwrap_or_else(|_| defaults.max_samples.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_MAX_SAMPLES")?,

            max_incidents: env::var("RISK_MAX_INCIDENTS")
                .unwrap_or_else(|_| defaults.max_incidents.to_string())
                .parse()
                .map_err(|_| "Invalid RISK_MAX_INCIDENTS")?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(10.0..=5_000.0).contains(&self.cell_radius_m) {
            return Err("RISK_CELL_RADIUS_M must be between 10 and 5000 meters".to_string());
        }
        if self.hour_window > 12 {
            return Err("RISK_HOUR_WINDOW must be at most 12".to_string());
        }
        if self.sample_interval_m < 10.0 {
            return Err("ROUTE_SAMPLE_INTERVAL_M must be at least 10 meters".to_string());
        }
        if self.max_samples < 2 || self.max_samples > MAX_ASSESSMENT_COORDINATES {
            return Err(format!(
                "ROUTE_MAX_SAMPLES must be between 2 and {}",
                MAX_ASSESSMENT_COORDINATES
            ));
        }
        if self.max_incidents < 1 {
            return Err("RISK_MAX_INCIDENTS must be positive".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Run the background sweep loop; `/jobs/process` works either way
    pub enabled: bool,
    pub sweep_interval_secs: u64,
    /// Jobs claimed per table per sweep
    pub batch_size: i64,
    /// Attempts before a job is marked failed
    pub max_attempts: i32,
    /// Seconds before a `sending` row is considered abandoned
    pub lease_secs: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval_secs: DEFAULT_OUTBOX_SWEEP_INTERVAL_SECONDS,
            batch_size: DEFAULT_OUTBOX_BATCH_SIZE,
            max_attempts: DEFAULT_OUTBOX_MAX_ATTEMPTS,
            lease_secs: DEFAULT_OUTBOX_LEASE_SECONDS,
        }
    }
}

impl DispatcherConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let config = Self {
            enabled: env::var("OUTBOX_ENABLED")
                .unwrap_or_else(|_| defaults.enabled.to_string())
                .parse()
                .map_err(|_| "Invalid OUTBOX_ENABLED (expected true or false)")?,

            sweep_interval_secs: env::var("OUTBOX_SWEEP_INTERVAL")
                .unwrap_or_else(|_| defaults.sweep_interval_secs.to_string())
                .parse()
                .map_err(|_| "Invalid OUTBOX_SWEEP_INTERVAL")?,

            batch_size: env::var("OUTBOX_BATCH_SIZE")
                .unwrap_or_else(|_| defaults.batch_size.to_string())
                .parse()
                .map_err(|_| "Invalid OUTBOX_BATCH_SIZE")?,

            max_attempts: env::var("OUTBOX_MAX_ATTEMPTS")
                .unwrap_or_else(|_| defaults.max_attempts.to_string())
                .parse()
                .map_err(|_| "Invalid OUTBOX_MAX_ATTEMPTS")?,

            lease_secs: env::var("OUTBOX_LEASE_SECONDS")
                .unwrap_or_else(|_| defaults.lease_secs.to_string())
                .parse()
                .map_err(|_| "Invalid OUTBOX_LEASE_SECONDS")?,
        };

        if config.sweep_interval_secs == 0 {
            return Err("OUTBOX_SWEEP_INTERVAL must be positive".to_string());
        }
        if config.batch_size <= 0 {
            return Err("OUTBOX_BATCH_SIZE must be positive".to_string());
        }
        if config.max_attempts <= 0 {
            return Err("OUTBOX_MAX_ATTEMPTS must be positive".to_string());
        }

        Ok(config)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_secs)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| "Invalid PORT")?,
            database_url: env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL").ok(),
            mapbox_api_key: env::var("MAPBOX_API_KEY").map_err(|_| "MAPBOX_API_KEY must be set")?,
            mapbox_base_url: env::var("MAPBOX_BASE_URL").ok(),
            resend_api_key: env::var("RESEND_API_KEY").ok(),
            email_from: env::var("EMAIL_FROM").unwrap_or_else(|_| DEFAULT_EMAIL_FROM.to_string()),
            expo_access_token: env::var("EXPO_ACCESS_TOKEN").ok(),
            facility_cache_ttl: env::var("FACILITY_CACHE_TTL")
                .unwrap_or_else(|_| DEFAULT_FACILITY_CACHE_TTL_SECONDS.to_string())
                .parse()
                .map_err(|_| "Invalid FACILITY_CACHE_TTL")?,
            facility_bounds: env::var("FACILITY_BOUNDS")
                .unwrap_or_else(|_| DEFAULT_FACILITY_BOUNDS.to_string())
                .parse()?,
            risk: RiskConfig::from_env()?,
            dispatcher: DispatcherConfig::from_env()?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_defaults_are_valid() {
        assert!(RiskConfig::default().validate().is_ok());
    }

    #[test]
    fn risk_validation_rejects_out_of_range() {
        let config = RiskConfig {
            cell_radius_m: 1.0,
            ..RiskConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RiskConfig {
            max_samples: 1,
            ..RiskConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RiskConfig {
            max_incidents: 0,
            ..RiskConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn dispatcher_durations() {
        let config = DispatcherConfig::default();
        assert_eq!(config.sweep_interval(), Duration::from_secs(30));
        assert_eq!(config.lease(), Duration::from_secs(300));
    }
}
