//! HTTP-level tests for the public catalog endpoints.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use event_catalog::config::AppConfig;
use event_catalog::ingest::{DatabaseAuditSink, IngestJob, StaticFeed};
use event_catalog::server::{AppState, create_app};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;

mod test_utils;
use test_utils::{base_event, event, event_on, feed, setup_test_db, zone};

async fn seed(db: &Arc<DatabaseConnection>) {
    let body = feed(&[
        base_event(
            1,
            "Camela en concierto",
            "online",
            &[
                event_on(
                    11,
                    "2021-07-02T22:15:00",
                    "2021-02-01T10:00:00",
                    "2021-06-30T20:00:00",
                    &[
                        zone(100, "Platea", "10.00", 50, "true"),
                        zone(101, "Grada", "25.50", 50, "false"),
                    ],
                ),
                event(
                    12,
                    "2021-03-01T09:00:00",
                    "2021-05-01T18:00:00",
                    &[zone(102, "Palco", "40.00", 4, "true")],
                ),
            ],
        ),
        base_event(
            2,
            "Offline only",
            "offline",
            &[event(
                21,
                "2021-02-01T00:00:00",
                "2021-03-01T00:00:00",
                &[zone(200, "Z", "5.00", 1, "true")],
            )],
        ),
        base_event(
            3,
            "No zones yet",
            "online",
            &[event(31, "2021-04-01T12:00:00", "2021-04-02T12:00:00", &[])],
        ),
        base_event(
            4,
            "Sold before the window",
            "online",
            &[event(
                41,
                "2020-12-01T00:00:00",
                "2021-03-01T00:00:00",
                &[zone(400, "Z", "8.00", 1, "true")],
            )],
        ),
    ]);

    let job = IngestJob::new(
        Arc::new(StaticFeed::new(body)),
        Arc::clone(db),
        Arc::new(DatabaseAuditSink::new(Arc::clone(db))),
        "api-test",
    );
    let summary = job.run().await.unwrap();
    assert_eq!(summary.failed, 0);
}

async fn setup_test_app() -> axum::Router {
    let db = setup_test_db().await.unwrap();
    seed(&db).await;

    create_app(AppState {
        db,
        config: Arc::new(AppConfig {
            profile: "test".to_string(),
            ..Default::default()
        }),
    })
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Option<String>, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn lists_online_events_inside_the_window() {
    let app = setup_test_app().await;

    let (status, _, body) = get(app, "/events?starts_at=2021-01-01&ends_at=2021-12-31").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].is_null());

    let events = body["data"]["events"].as_array().unwrap();
    let titles: Vec<_> = events.iter().map(|e| e["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Camela en concierto", "No zones yet"]);

    let camela = &events[0];
    assert_eq!(camela["start_date"], "2021-03-01");
    assert_eq!(camela["start_time"], "09:00:00");
    // end date from the closing sell window, end time from that event's show
    assert_eq!(camela["end_date"], "2021-06-30");
    assert_eq!(camela["end_time"], "22:15:00");
    assert_eq!(camela["min_price"], "10.00");
    assert_eq!(camela["max_price"], "40.00");
}

#[tokio::test]
async fn events_without_zones_report_not_available_prices() {
    let app = setup_test_app().await;

    let (_, _, body) = get(app, "/events?starts_at=2021-01-01&ends_at=2021-12-31").await;
    let no_zones = body["data"]["events"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["title"] == "No zones yet")
        .unwrap()
        .clone();

    assert_eq!(no_zones["min_price"], "N/A");
    assert_eq!(no_zones["max_price"], "N/A");
    assert_eq!(no_zones["start_date"], "2021-04-01");
}

#[tokio::test]
async fn window_bounds_are_exclusive() {
    let app = setup_test_app().await;

    // sell_to 2021-04-02T12:00 is not before midnight of 2021-04-02
    let (status, _, body) = get(app, "/events?starts_at=2021-03-31&ends_at=2021-04-02").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["events"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn missing_starts_at_is_a_validation_problem() {
    let app = setup_test_app().await;

    let (status, content_type, body) = get(app, "/events?ends_at=2021-12-31").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/problem+json"));
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert!(body["message"].as_str().unwrap().contains("starts_at"));
    assert!(body["trace_id"].is_string());
}

#[tokio::test]
async fn malformed_date_is_rejected() {
    let app = setup_test_app().await;

    let (status, _, body) = get(app, "/events?starts_at=2021-01-01&ends_at=31-12-2021").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["ends_at"], "31-12-2021");
}

#[tokio::test]
async fn healthz_reports_ok_with_database() {
    let app = setup_test_app().await;

    let (status, _, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn responses_echo_the_inbound_trace_id() {
    let app = setup_test_app().await;

    let request = Request::builder()
        .uri("/")
        .header("x-trace-id", "abc123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-trace-id"], "abc123");
}
