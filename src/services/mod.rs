pub mod broadcast;
pub mod dispatcher;
pub mod email;
pub mod facility_service;
pub mod geocoding;
pub mod mapbox;
pub mod overpass;
pub mod push;
pub mod route_safety;
pub mod sampler;

pub use broadcast::EmergencyBroadcaster;
pub use dispatcher::{OutboxDispatcher, SweepReport};
pub use email::{DeliveryError, EmailSender, ResendClient};
pub use facility_service::FacilityService;
pub use geocoding::{Geocoder, GeocodingClient, Place};
pub use mapbox::{DirectionsProvider, DirectionsResponse, MapboxClient};
pub use overpass::{FacilitySource, OverpassClient};
pub use push::{ExpoPushClient, PushOutcome, PushSender};
pub use route_safety::RouteSafetyService;
