pub mod density;
pub mod segments;

pub use segments::{
    calculate_safety_score, generate_route_recommendations, group_into_segments,
    overall_risk_level, summarize_route,
};

use crate::config::RiskConfig;
use crate::db::{IncidentQuery, RiskRepository};
use crate::error::{AppError, Result};
use crate::models::{
    BoundingBox, Coordinates, CrimeFilters, CrimeIncident, PointAssessment, PointRiskMetadata,
    PointRiskResponse, RouteSafetyReport, TimeWindow,
};
use std::sync::Arc;

/// Per-sample assessments plus the distinct incident count along the path
#[derive(Debug, Clone)]
pub struct RouteRiskLookup {
    pub assessments: Vec<PointAssessment>,
    pub route_crime_count: i64,
}

/// Turns located incidents into point, path and route assessments
pub struct RouteSafetyService {
    risk_repo: Arc<dyn RiskRepository>,
    config: RiskConfig,
}

impl RouteSafetyService {
    pub fn new(risk_repo: Arc<dyn RiskRepository>, config: RiskConfig) -> Self {
        RouteSafetyService { risk_repo, config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    fn incident_query(
        &self,
        bbox: BoundingBox,
        filters: &CrimeFilters,
        time: &TimeWindow,
    ) -> Result<IncidentQuery> {
        filters.date_range().map_err(AppError::InvalidRequest)?;
        time.validate().map_err(AppError::InvalidRequest)?;

        Ok(IncidentQuery {
            bbox,
            filters: filters.clone(),
            time: *time,
            hour_window: self.config.hour_window,
            timezone: self.config.timezone.clone(),
            limit: self.config.max_incidents,
        })
    }

    /// Fetch incidents for `query`; more than `query.limit` fails the lookup
    async fn fetch_incidents(&self, query: &IncidentQuery) -> Result<Vec<CrimeIncident>> {
        let incidents = self.risk_repo.crimes_in_bbox(query).await?;
        if incidents.len() as i64 > query.limit {
            return Err(AppError::Internal(format!(
                "incident lookup exceeded {} rows; narrow the filters or area",
                query.limit
            )));
        }
        Ok(incidents)
    }

    /// Assess each coordinate with a single incident fetch over the
    /// path's bounding box
    pub async fn assess_points(
        &self,
        coords: &[Coordinates],
        filters: &CrimeFilters,
        time: &TimeWindow,
    ) -> Result<RouteRiskLookup> {
        if coords.is_empty() {
            return Ok(RouteRiskLookup {
                assessments: Vec::new(),
                route_crime_count: 0,
            });
        }

        let radius = self.config.cell_radius_m;
        let bbox = BoundingBox::from_path_with_buffer(coords, radius);
        let query = self.incident_query(bbox, filters, time)?;
        let incidents = self.fetch_incidents(&query).await?;

        let assessments = density::assess_samples(coords, &incidents, radius);
        let route_crime_count = density::count_near_path(coords, &incidents, radius);

        tracing::debug!(
            points = coords.len(),
            incidents = incidents.len(),
            route_crime_count,
            "Assessed {} points against {} incidents",
            coords.len(),
            incidents.len()
        );

        Ok(RouteRiskLookup {
            assessments,
            route_crime_count,
        })
    }

    /// Full route report: per-point lookup, segment grouping and overall
    /// assessment
    pub async fn assess_route(
        &self,
        coords: &[Coordinates],
        filters: &CrimeFilters,
        time: &TimeWindow,
        distance: Option<f64>,
        duration: Option<f64>,
    ) -> Result<RouteSafetyReport> {
        let lookup = self.assess_points(coords, filters, time).await?;
        let pairs: Vec<[f64; 2]> = coords.iter().map(|c| c.to_lng_lat()).collect();

        let segments = group_into_segments(&lookup.assessments, &pairs);
        let overall_assessment = summarize_route(
            &lookup.assessments,
            &segments,
            lookup.route_crime_count,
            distance,
            duration,
        );

        tracing::info!(
            points = coords.len(),
            segments = segments.len(),
            risk_level = %overall_assessment.risk_level,
            safety_score = overall_assessment.safety_score,
            "Route assessed: {} ({:.1})",
            overall_assessment.risk_level,
            overall_assessment.safety_score
        );

        Ok(RouteSafetyReport {
            segments,
            overall_assessment,
        })
    }

    /// Risk of the grid cell around one point, with its perimeter for display
    pub async fn assess_point(
        &self,
        point: Coordinates,
        filters: &CrimeFilters,
        time: &TimeWindow,
    ) -> Result<PointRiskResponse> {
        let radius = self.config.cell_radius_m;
        let cell = BoundingBox::from_center_radius(&point, radius);
        let query = self.incident_query(cell, filters, time)?;
        let incidents = self.fetch_incidents(&query).await?;

        let assessment = PointAssessment::from_count(density::count_near(&point, &incidents, radius));

        Ok(PointRiskResponse {
            success: true,
            risk_level: assessment.risk_level,
            crime_count: assessment.crime_count,
            perimeter: cell.perimeter(),
            metadata: PointRiskMetadata {
                center: point,
                radius_meters: radius,
                time: *time,
                hour_window: self.config.hour_window,
                timezone: self.config.timezone.clone(),
            },
        })
    }
}
