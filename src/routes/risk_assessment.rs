use crate::error::{AppError, Result};
use crate::models::{Coordinates, CrimeFilters, PointRiskResponse, TimeWindow};
use crate::AppState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessmentQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub hour: Option<u8>,
    pub day: Option<u8>,
    pub month: Option<u8>,
    /// Comma-separated crime type ids
    pub crime_types: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl RiskAssessmentQuery {
    fn point(&self) -> std::result::Result<Coordinates, String> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Coordinates::new(lat, lng),
            _ => Err("lat and lng are required".to_string()),
        }
    }

    fn filters(&self) -> std::result::Result<CrimeFilters, String> {
        let crime_type_ids = self
            .crime_types
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| s.parse::<i32>().map_err(|_| format!("Invalid crime type id: {}", s)))
                    .collect::<std::result::Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(CrimeFilters {
            crime_type_ids,
            date_from: self.date_from.clone(),
            date_to: self.date_to.clone(),
            ..Default::default()
        })
    }
}

/// GET /bigquery/risk-assessment?lat&lng&hour&day&month
pub async fn assess_point(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<RiskAssessmentQuery>, QueryRejection>,
) -> Result<Json<PointRiskResponse>> {
    let Query(query) = query?;
    let point = query.point().map_err(AppError::InvalidRequest)?;
    let filters = query.filters().map_err(AppError::InvalidRequest)?;
    let time = TimeWindow {
        hour: query.hour,
        day: query.day,
        month: query.month,
    };

    let report = state.route_safety.assess_point(point, &filters, &time).await?;
    Ok(Json(report))
}
