//! Incident counting around sampled points.
//!
//! The repository returns every matching incident inside the route's
//! bounding box; the per-point and route-wide counts are computed here.

use crate::models::{BoundingBox, Coordinates, CrimeIncident, PointAssessment};
use std::collections::HashSet;

/// Incidents within `radius_m` of `center`
pub fn count_near(center: &Coordinates, incidents: &[CrimeIncident], radius_m: f64) -> i64 {
    // Cheap box test before the haversine
    let bbox = BoundingBox::from_center_radius(center, radius_m);
    incidents
        .iter()
        .filter(|i| bbox.contains(&i.coordinates))
        .filter(|i| center.distance_m(&i.coordinates) <= radius_m)
        .count() as i64
}

/// One assessment per sample, in sample order
pub fn assess_samples(
    samples: &[Coordinates],
    incidents: &[CrimeIncident],
    radius_m: f64,
) -> Vec<PointAssessment> {
    samples
        .iter()
        .map(|s| PointAssessment::from_count(count_near(s, incidents, radius_m)))
        .collect()
}

/// Distinct incidents within `radius_m` of any part of the path
pub fn count_near_path(path: &[Coordinates], incidents: &[CrimeIncident], radius_m: f64) -> i64 {
    if path.is_empty() {
        return 0;
    }

    let bbox = BoundingBox::from_path_with_buffer(path, radius_m);
    let mut seen = HashSet::new();

    incidents
        .iter()
        .filter(|i| bbox.contains(&i.coordinates))
        .filter(|i| {
            i.coordinates
                .distance_to_path_m(path)
                .is_some_and(|d| d <= radius_m)
        })
        .filter(|i| seen.insert(i.case_id))
        .count() as i64
}
