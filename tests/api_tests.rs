use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bantay::models::Coordinates;
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use tower::ServiceExt;

mod common;

use common::TestHarness;

fn hotspot() -> Coordinates {
    Coordinates::new(14.37, 121.02).unwrap()
}

fn harness_with_hotspot() -> TestHarness {
    TestHarness::new(common::incident_cluster(hotspot(), 12, 1))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let harness = TestHarness::new(vec![]);

    let (status, json) = send(harness.app(), get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["checks"]["database"], "ok");
    assert_eq!(json["checks"]["cache"]["backend"], "memory");
    assert_eq!(json["checks"]["cache"]["healthy"], true);
}

#[tokio::test]
async fn test_health_check_reports_database_down() {
    let harness = TestHarness::new(vec![]);
    harness.risk_repo.down.store(true, Ordering::SeqCst);

    let (status, json) = send(harness.app(), get("/api/health")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "error");
    assert!(json["checks"]["database"]["error"].is_string());
}

#[tokio::test]
async fn test_route_assessment_segments_hotspot() {
    let harness = harness_with_hotspot();
    let body = json!({
        "coordinates": [[121.01, 14.37], [121.02, 14.37], [121.03, 14.37]]
    });

    let (status, json) = send(harness.app(), post_json("/api/bigquery/route-assessment", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let segments = json["segments"].as_array().unwrap();
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0]["riskLevel"], "LOW");
    assert_eq!(segments[1]["riskLevel"], "HIGH");
    assert_eq!(segments[1]["crimeCount"], 12);

    let overall = &json["overallAssessment"];
    assert_eq!(overall["highRiskSegments"], 1);
    assert_eq!(overall["lowRiskSegments"], 2);
    assert_eq!(overall["routeCrimeCount"], 12);
    assert!(overall["recommendations"].as_array().unwrap().len() >= 1);
    assert!(overall.get("distance").is_none());
}

#[tokio::test]
async fn test_route_assessment_passes_filters_to_repository() {
    let harness = harness_with_hotspot();
    let body = json!({
        "coordinates": [[121.01, 14.37], [121.03, 14.37]],
        "filters": { "crimeTypeIds": [3, 7], "dateFrom": "2024-01-01" },
        "time": { "hour": 23, "day": 5 }
    });

    let (status, _) = send(harness.app(), post_json("/api/bigquery/route-assessment", body)).await;
    assert_eq!(status, StatusCode::OK);

    let queries = harness.risk_repo.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].filters.crime_type_ids, Some(vec![3, 7]));
    assert_eq!(queries[0].time.hour, Some(23));
    assert_eq!(queries[0].time.day, Some(5));
}

#[tokio::test]
async fn test_route_assessment_requires_two_coordinates() {
    let harness = harness_with_hotspot();
    let body = json!({ "coordinates": [[121.02, 14.37]] });

    let (status, json) = send(harness.app(), post_json("/api/bigquery/route-assessment", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("At least 2"));
}

#[tokio::test]
async fn test_route_assessment_malformed_body_uses_error_envelope() {
    let harness = harness_with_hotspot();
    let request = Request::builder()
        .method("POST")
        .uri("/api/bigquery/route-assessment")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"coordinates\": "))
        .unwrap();

    let (status, json) = send(harness.app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_route_assessment_rejects_bad_month() {
    let harness = harness_with_hotspot();
    let body = json!({
        "coordinates": [[121.01, 14.37], [121.03, 14.37]],
        "time": { "month": 13 }
    });

    let (status, json) = send(harness.app(), post_json("/api/bigquery/route-assessment", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_point_risk_assessment() {
    let harness = harness_with_hotspot();

    let (status, json) = send(
        harness.app(),
        get("/api/bigquery/risk-assessment?lat=14.37&lng=121.02&hour=22"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["riskLevel"], "HIGH");
    assert_eq!(json["crimeCount"], 12);
    assert_eq!(json["perimeter"].as_array().unwrap().len(), 5);
    assert_eq!(json["metadata"]["hour"], 22);
    assert_eq!(json["metadata"]["timezone"], "Asia/Manila");
}

#[tokio::test]
async fn test_point_risk_assessment_quiet_area() {
    let harness = harness_with_hotspot();

    let (status, json) = send(
        harness.app(),
        get("/api/bigquery/risk-assessment?lat=14.40&lng=121.06"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["riskLevel"], "LOW");
    assert_eq!(json["crimeCount"], 0);
}

#[tokio::test]
async fn test_point_risk_assessment_requires_lat() {
    let harness = harness_with_hotspot();

    let (status, json) = send(harness.app(), get("/api/bigquery/risk-assessment?lng=121.02")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_point_risk_assessment_bad_crime_types() {
    let harness = harness_with_hotspot();

    let (status, json) = send(
        harness.app(),
        get("/api/bigquery/risk-assessment?lat=14.37&lng=121.02&crimeTypes=1,x"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("crime type"));
}

#[tokio::test]
async fn test_facilities_are_cached() {
    let harness = TestHarness::new(vec![]);
    let app = harness.app();

    let (status, json) = send(app.clone(), get("/api/facilities")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    assert_eq!(json["metadata"]["count"], 2);
    assert!(json["metadata"].get("stale").is_none());

    let (status, _) = send(app, get("/api/facilities")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(harness.facility_source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_facilities_upstream_failure_without_cache() {
    let harness = TestHarness::new(vec![]);
    harness.facility_source.fail.store(true, Ordering::SeqCst);

    let (status, json) = send(harness.app(), get("/api/facilities")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_safe_route_endpoint() {
    let harness = harness_with_hotspot();
    let body = json!({
        "origin": { "lat": 14.37, "lng": 121.01 },
        "destination": { "lat": 14.37, "lng": 121.03, "address": "Town plaza" },
        "mode": "walking"
    });

    let (status, json) = send(harness.app(), post_json("/api/routes/safe", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["mode"], "walking");
    assert_eq!(json["destination"]["address"], "Town plaza");
    assert_eq!(json["geometry"].as_array().unwrap().len(), 2);
    assert!(json["samples"].as_array().unwrap().len() > 2);

    let overall = &json["overallAssessment"];
    assert!(overall["distance"].as_f64().unwrap() > 2000.0);
    assert!(overall["duration"].as_f64().unwrap() > 0.0);
    assert!(overall["highRiskSegments"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_safe_route_invalid_origin() {
    let harness = harness_with_hotspot();
    let body = json!({
        "origin": { "lat": 95.0, "lng": 121.01 },
        "destination": { "lat": 14.37, "lng": 121.03 }
    });

    let (status, json) = send(harness.app(), post_json("/api/routes/safe", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("origin"));
}

#[tokio::test]
async fn test_safe_route_directions_failure() {
    let harness = harness_with_hotspot();
    harness.directions.fail.store(true, Ordering::SeqCst);
    let body = json!({
        "origin": { "lat": 14.37, "lng": 121.01 },
        "destination": { "lat": 14.37, "lng": 121.03 }
    });

    let (status, json) = send(harness.app(), post_json("/api/routes/safe", body)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "Routing service error");
}

#[tokio::test]
async fn test_reverse_geocode() {
    let harness = TestHarness::new(vec![]);

    let (status, json) = send(harness.app(), get("/api/geocode/reverse?lat=14.36&lng=121.02")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["name"], "Rizal Street");
}

#[tokio::test]
async fn test_place_search_needs_both_proximity_coordinates() {
    let harness = TestHarness::new(vec![]);

    let (status, _) = send(harness.app(), get("/api/places/search?q=plaza&lat=14.36")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        harness.app(),
        get("/api/places/search?q=plaza&lat=14.36&lng=121.02"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"][0]["name"], "plaza");
}

#[tokio::test]
async fn test_emergency_broadcast_then_process_jobs() {
    let harness = TestHarness::new(vec![]);
    let app = harness.app();
    let body = json!({
        "title": "Flash flood",
        "message": "Move to higher ground",
        "location": "Brgy. San Roque"
    });

    let (status, json) = send(app.clone(), post_json("/api/emergency", body)).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["success"], true);
    assert_eq!(json["emailJobs"], 2);
    assert_eq!(json["pushJobs"], 1);

    let (status, json) = send(app, post_json("/api/jobs/process", json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["report"]["emailsSent"], 2);
    assert_eq!(json["report"]["pushSent"], 1);
    assert_eq!(harness.email.sent_count(), 2);

    let sent = harness.email.sent.lock().unwrap();
    assert!(sent.iter().all(|job| job.subject == "[Emergency] Flash flood"));
    assert!(sent.iter().any(|job| job.recipient == "captain@example.ph"));
}

#[tokio::test]
async fn test_emergency_with_explicit_recipients_email_only() {
    let harness = TestHarness::new(vec![]);
    let body = json!({
        "title": "Road closure",
        "message": "Bridge closed",
        "channels": ["email"],
        "recipients": ["one@example.ph", "ONE@example.ph", "two@example.ph"]
    });

    let (status, json) = send(harness.app(), post_json("/api/emergency", body)).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["emailJobs"], 2);
    assert_eq!(json["pushJobs"], 0);
    assert!(harness.outbox.push_statuses().is_empty());
}

#[tokio::test]
async fn test_emergency_requires_title() {
    let harness = TestHarness::new(vec![]);
    let body = json!({ "title": " ", "message": "Bridge closed" });

    let (status, json) = send(harness.app(), post_json("/api/emergency", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(harness.outbox.state.lock().unwrap().emergencies.is_empty());
}

#[tokio::test]
async fn test_register_push_token() {
    let harness = TestHarness::new(vec![]);

    let (status, _) = send(
        harness.app(),
        post_json("/api/push-tokens", json!({ "token": "fcm:not-expo" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        harness.app(),
        post_json(
            "/api/push-tokens",
            json!({ "token": "ExponentPushToken[device-2]", "platform": "android" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert!(harness
        .outbox
        .active_tokens()
        .contains(&"ExponentPushToken[device-2]".to_string()));
}
