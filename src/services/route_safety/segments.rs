//! Route segmentation and scoring.
//!
//! Pure functions over per-sample risk assessments, in route order.

use crate::constants::*;
use crate::models::{PointAssessment, RiskLevel, RouteOverallAssessment, RouteSegment};

/// Group consecutive samples that share a risk level.
///
/// The returned segments cover `0..n` contiguously, where `n` is the shorter
/// of the two slice lengths (callers pass equal lengths).
pub fn group_into_segments(
    assessments: &[PointAssessment],
    coordinates: &[[f64; 2]],
) -> Vec<RouteSegment> {
    debug_assert_eq!(assessments.len(), coordinates.len());

    let mut segments: Vec<RouteSegment> = Vec::new();
    let mut current: Option<RouteSegment> = None;

    for (index, (assessment, coordinate)) in assessments.iter().zip(coordinates).enumerate() {
        match current.as_mut() {
            Some(segment) if segment.risk_level == assessment.risk_level => {
                segment.end_index = index;
                segment.coordinates.push(*coordinate);
                segment.crime_count += assessment.crime_count;
            }
            _ => {
                if let Some(done) = current.take() {
                    segments.push(done);
                }
                current = Some(RouteSegment {
                    start_index: index,
                    end_index: index,
                    coordinates: vec![*coordinate],
                    risk_level: assessment.risk_level,
                    crime_count: assessment.crime_count,
                });
            }
        }
    }

    segments.extend(current);
    segments
}

/// Mean per-sample safety weight (20..=100); 100 for an empty route
pub fn calculate_safety_score(assessments: &[PointAssessment]) -> f64 {
    if assessments.is_empty() {
        return EMPTY_ROUTE_SAFETY_SCORE;
    }

    let total: f64 = assessments
        .iter()
        .map(|a| a.risk_level.safety_weight())
        .sum();
    total / assessments.len() as f64
}

/// Bucket a safety score; a score exactly on a threshold gets the safer level
pub fn overall_risk_level(score: f64) -> RiskLevel {
    if score >= OVERALL_LOW_MIN_SCORE {
        RiskLevel::Low
    } else if score >= OVERALL_LOW_MEDIUM_MIN_SCORE {
        RiskLevel::LowMedium
    } else if score >= OVERALL_MEDIUM_MIN_SCORE {
        RiskLevel::Medium
    } else if score >= OVERALL_MEDIUM_HIGH_MIN_SCORE {
        RiskLevel::MediumHigh
    } else {
        RiskLevel::High
    }
}

pub const RECOMMEND_AVOID_HIGH_RISK: &str =
    "Avoid lingering in the high-risk sections of this route and keep moving through them.";
pub const RECOMMEND_ALTERNATIVE_ROUTE: &str =
    "Consider an alternative route or travel with a companion, especially at night.";
pub const RECOMMEND_STAY_ALERT: &str =
    "Stay alert in moderate-risk areas and keep valuables out of sight.";
pub const RECOMMEND_WELL_LIT_ROADS: &str =
    "Stick to well-lit main roads and share your trip with someone you trust.";

/// Canned advice for a route, in a fixed order
pub fn generate_route_recommendations(
    segments: &[RouteSegment],
    overall_risk: RiskLevel,
) -> Vec<String> {
    let high = segments.iter().filter(|s| s.risk_level.is_high()).count();
    let medium = segments.iter().filter(|s| s.risk_level.is_medium()).count();

    let mut recommendations = Vec::with_capacity(MAX_ROUTE_RECOMMENDATIONS);

    if high > 0 {
        recommendations.push(RECOMMEND_AVOID_HIGH_RISK);
    }
    if overall_risk.is_high() {
        recommendations.push(RECOMMEND_ALTERNATIVE_ROUTE);
    }
    if medium > 0 {
        recommendations.push(RECOMMEND_STAY_ALERT);
    }
    if !segments.is_empty() {
        recommendations.push(RECOMMEND_WELL_LIT_ROADS);
    }

    recommendations.truncate(MAX_ROUTE_RECOMMENDATIONS);
    recommendations.into_iter().map(String::from).collect()
}

/// Aggregate segments and samples into the route-wide assessment
pub fn summarize_route(
    assessments: &[PointAssessment],
    segments: &[RouteSegment],
    route_crime_count: i64,
    distance: Option<f64>,
    duration: Option<f64>,
) -> RouteOverallAssessment {
    let safety_score = calculate_safety_score(assessments);
    let risk_level = overall_risk_level(safety_score);

    let high_risk_segments = segments.iter().filter(|s| s.risk_level.is_high()).count();
    let medium_risk_segments = segments.iter().filter(|s| s.risk_level.is_medium()).count();

    RouteOverallAssessment {
        risk_level,
        safety_score,
        total_crime_count: assessments.iter().map(|a| a.crime_count).sum(),
        route_crime_count,
        high_risk_segments,
        medium_risk_segments,
        low_risk_segments: segments.len() - high_risk_segments - medium_risk_segments,
        recommendations: generate_route_recommendations(segments, risk_level),
        distance,
        duration,
    }
}
