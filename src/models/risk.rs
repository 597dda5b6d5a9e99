use crate::constants::*;
use crate::models::Coordinates;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::macros::format_description;
use time::Date;

/// Ordinal crime-risk bucket, safest first
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    LowMedium,
    Medium,
    MediumHigh,
    High,
}

impl RiskLevel {
    /// Per-point weight averaged into the route safety score
    pub fn safety_weight(self) -> f64 {
        match self {
            RiskLevel::Low => SAFETY_WEIGHT_LOW,
            RiskLevel::LowMedium => SAFETY_WEIGHT_LOW_MEDIUM,
            RiskLevel::Medium => SAFETY_WEIGHT_MEDIUM,
            RiskLevel::MediumHigh => SAFETY_WEIGHT_MEDIUM_HIGH,
            RiskLevel::High => SAFETY_WEIGHT_HIGH,
        }
    }

    /// Bucket a grid-cell incident count
    pub fn from_crime_count(count: i64) -> Self {
        if count >= CRIME_COUNT_HIGH_MIN {
            RiskLevel::High
        } else if count >= CRIME_COUNT_MEDIUM_HIGH_MIN {
            RiskLevel::MediumHigh
        } else if count >= CRIME_COUNT_MEDIUM_MIN {
            RiskLevel::Medium
        } else if count >= CRIME_COUNT_LOW_MEDIUM_MIN {
            RiskLevel::LowMedium
        } else {
            RiskLevel::Low
        }
    }

    pub fn is_high(self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::MediumHigh)
    }

    pub fn is_medium(self) -> bool {
        self == RiskLevel::Medium
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::LowMedium => "LOW_MEDIUM",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::MediumHigh => "MEDIUM_HIGH",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(RiskLevel::Low),
            "LOW_MEDIUM" => Ok(RiskLevel::LowMedium),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "MEDIUM_HIGH" => Ok(RiskLevel::MediumHigh),
            "HIGH" => Ok(RiskLevel::High),
            _ => Err(format!("Invalid risk level: {}", s)),
        }
    }
}

/// Risk lookup result for one sampled coordinate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PointAssessment {
    pub risk_level: RiskLevel,
    pub crime_count: i64,
}

impl PointAssessment {
    pub fn new(risk_level: RiskLevel, crime_count: i64) -> Self {
        PointAssessment {
            risk_level,
            crime_count,
        }
    }

    pub fn from_count(crime_count: i64) -> Self {
        Self::new(RiskLevel::from_crime_count(crime_count), crime_count)
    }
}

/// Optional narrowing of the incidents counted by a risk lookup
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CrimeFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crime_type_ids: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_filters: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barangay_filters: Option<Vec<String>>,
    /// Inclusive, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    /// Inclusive, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
}

impl CrimeFilters {
    /// Parse and check the date bounds
    pub fn date_range(&self) -> Result<(Option<Date>, Option<Date>), String> {
        let from = self.date_from.as_deref().map(parse_date).transpose()?;
        let to = self.date_to.as_deref().map(parse_date).transpose()?;

        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(format!("dateFrom ({}) is after dateTo ({})", f, t));
            }
        }

        Ok((from, to))
    }

    /// Empty filter lists behave like absent ones
    pub fn crime_type_ids(&self) -> Option<&[i32]> {
        self.crime_type_ids.as_deref().filter(|v| !v.is_empty())
    }

    pub fn status_filters(&self) -> Option<&[String]> {
        self.status_filters.as_deref().filter(|v| !v.is_empty())
    }

    pub fn barangay_filters(&self) -> Option<&[String]> {
        self.barangay_filters.as_deref().filter(|v| !v.is_empty())
    }
}

fn parse_date(s: &str) -> Result<Date, String> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| format!("Invalid date '{}': expected YYYY-MM-DD", s))
}

/// Time-of-occurrence constraints on counted incidents
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    /// Hour of day 0-23; matched with a configurable +/- window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u8>,
    /// Day of week 0-6, Sunday = 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u8>,
    /// Month 1-12
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u8>,
}

impl TimeWindow {
    pub fn validate(&self) -> Result<(), String> {
        if matches!(self.hour, Some(h) if h > 23) {
            return Err("hour must be between 0 and 23".to_string());
        }
        if matches!(self.day, Some(d) if d > 6) {
            return Err("day must be between 0 (Sunday) and 6".to_string());
        }
        if matches!(self.month, Some(m) if !(1..=12).contains(&m)) {
            return Err("month must be between 1 and 12".to_string());
        }
        Ok(())
    }
}

/// One reported incident with a known location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrimeIncident {
    pub case_id: i64,
    pub coordinates: Coordinates,
}

/// Body of `GET /bigquery/risk-assessment`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointRiskResponse {
    pub success: bool,
    pub risk_level: RiskLevel,
    pub crime_count: i64,
    /// Closed `[lng, lat]` ring around the counted cell
    pub perimeter: Vec<[f64; 2]>,
    pub metadata: PointRiskMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointRiskMetadata {
    pub center: Coordinates,
    pub radius_meters: f64,
    #[serde(flatten)]
    pub time: TimeWindow,
    pub hour_window: u8,
    pub timezone: String,
}
