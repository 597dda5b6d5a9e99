// Library exports for testing and reusability

pub mod cache;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use error::{AppError, Result};

use db::{OutboxRepository, RiskRepository};
use services::{
    DirectionsProvider, EmergencyBroadcaster, FacilityService, Geocoder, OutboxDispatcher,
    RouteSafetyService,
};
use std::sync::Arc;

// App state shared by every handler. Outbound services sit behind traits
// so tests can swap in fakes.
pub struct AppState {
    pub risk_repo: Arc<dyn RiskRepository>,
    pub outbox_repo: Arc<dyn OutboxRepository>,
    pub route_safety: RouteSafetyService,
    pub directions: Arc<dyn DirectionsProvider>,
    pub geocoder: Arc<dyn Geocoder>,
    pub facilities: FacilityService,
    pub broadcaster: EmergencyBroadcaster,
    pub dispatcher: Arc<OutboxDispatcher>,
}
