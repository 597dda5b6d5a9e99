use crate::models::{BoundingBox, Coordinates};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Emergency facility categories pulled from OpenStreetMap
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FacilityKind {
    PoliceStation,
    Hospital,
    Clinic,
    FireStation,
}

impl FacilityKind {
    pub const ALL: [FacilityKind; 4] = [
        FacilityKind::PoliceStation,
        FacilityKind::Hospital,
        FacilityKind::Clinic,
        FacilityKind::FireStation,
    ];

    /// OSM `amenity=*` value
    pub fn osm_amenity(self) -> &'static str {
        match self {
            FacilityKind::PoliceStation => "police",
            FacilityKind::Hospital => "hospital",
            FacilityKind::Clinic => "clinic",
            FacilityKind::FireStation => "fire_station",
        }
    }

    pub fn from_osm_amenity(amenity: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.osm_amenity() == amenity)
    }
}

impl fmt::Display for FacilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.osm_amenity())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    pub osm_id: i64,
    pub name: String,
    pub kind: FacilityKind,
    pub coordinates: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// What the facility cache stores: one fetch of the municipality's facilities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitySnapshot {
    pub facilities: Vec<Facility>,
    pub bounds: BoundingBox,
    #[serde(with = "time::serde::rfc3339")]
    pub fetched_at: OffsetDateTime,
}

impl FacilitySnapshot {
    pub fn new(facilities: Vec<Facility>, bounds: BoundingBox) -> Self {
        FacilitySnapshot {
            facilities,
            bounds,
            fetched_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn age_seconds(&self, now: OffsetDateTime) -> i64 {
        (now - self.fetched_at).whole_seconds()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitiesMetadata {
    pub count: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
    pub bounds: BoundingBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilitiesResponse {
    pub success: bool,
    pub data: Vec<Facility>,
    pub metadata: FacilitiesMetadata,
}

impl FacilitiesResponse {
    pub fn from_snapshot(snapshot: FacilitySnapshot, stale: bool) -> Self {
        FacilitiesResponse {
            success: true,
            metadata: FacilitiesMetadata {
                count: snapshot.facilities.len(),
                last_updated: snapshot.fetched_at,
                bounds: snapshot.bounds,
                stale: stale.then_some(true),
            },
            data: snapshot.facilities,
        }
    }
}
