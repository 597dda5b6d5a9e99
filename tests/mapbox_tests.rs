use bantay::models::{Coordinates, TransportMode};
use bantay::services::{DirectionsProvider, Geocoder, GeocodingClient, MapboxClient};

mod common;

fn api_key() -> String {
    std::env::var("MAPBOX_API_KEY").expect("MAPBOX_API_KEY must be set for integration tests")
}

#[tokio::test]
async fn test_mapbox_walking_directions() {
    if common::should_skip_real_api_tests() {
        println!("Skipping real API test");
        return;
    }

    let client = MapboxClient::new(api_key());

    // Municipal hall to the public market
    let hall = Coordinates::new(14.3634, 121.0213).unwrap();
    let market = Coordinates::new(14.3702, 121.0345).unwrap();

    let result = client
        .get_directions(&[hall, market], TransportMode::Walking)
        .await;

    assert!(result.is_ok(), "Mapbox API call should succeed");

    let directions = result.unwrap();
    assert!(directions.distance_meters > 0.0, "Distance should be positive");
    assert!(directions.duration_seconds > 0.0, "Duration should be positive");
    assert!(directions.geometry.len() >= 2, "Geometry should be a line");

    let straight_line = hall.distance_m(&market);
    assert!(
        directions.distance_meters >= straight_line * 0.9,
        "Routed distance {} should not beat the straight line {}",
        directions.distance_meters,
        straight_line
    );
}

#[tokio::test]
async fn test_mapbox_reverse_geocode() {
    if common::should_skip_real_api_tests() {
        println!("Skipping real API test");
        return;
    }

    let client = GeocodingClient::new(api_key());
    let point = Coordinates::new(14.3634, 121.0213).unwrap();

    let place = client.reverse(point).await.expect("reverse geocode should succeed");

    assert!(place.is_some(), "A populated point should resolve to a place");
}
