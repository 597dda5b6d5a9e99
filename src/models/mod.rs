pub mod bbox;
pub mod coordinates;
pub mod facility;
pub mod outbox;
pub mod risk;
pub mod route;

pub use bbox::BoundingBox;
pub use coordinates::Coordinates;
pub use facility::{
    FacilitiesMetadata, FacilitiesResponse, Facility, FacilityKind, FacilitySnapshot,
};
pub use outbox::{
    BroadcastSummary, Channel, EmailJob, EmergencyBroadcastRequest, FailureDisposition,
    JobStatus, NewEmailJob, NewEmergency, NewPushJob, PushDeliveryLog, PushJob,
    PushTokenRegistration,
};
pub use risk::{
    CrimeFilters, CrimeIncident, PointAssessment, PointRiskMetadata, PointRiskResponse, RiskLevel,
    TimeWindow,
};
pub use route::{
    RouteAssessmentRequest, RouteAssessmentResponse, RouteOverallAssessment, RoutePoint,
    RouteSafetyReport, RouteSegment, SafeRouteRequest, SafeRouteResponse, TransportMode,
};
