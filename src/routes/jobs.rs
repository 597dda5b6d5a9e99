use crate::error::Result;
use crate::services::SweepReport;
use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ProcessJobsResponse {
    pub success: bool,
    pub report: SweepReport,
}

/// POST /jobs/process
/// Run one outbox sweep now instead of waiting for the interval
pub async fn process_jobs(State(state): State<Arc<AppState>>) -> Result<Json<ProcessJobsResponse>> {
    let report = state.dispatcher.run_once().await?;
    Ok(Json(ProcessJobsResponse {
        success: true,
        report,
    }))
}
