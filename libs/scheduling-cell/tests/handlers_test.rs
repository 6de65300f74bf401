use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use directory_cell::services::FamilyDirectory;
use scheduling_cell::router::scheduling_routes;
use scheduling_cell::SchedulingState;
use shared_models::auth::Role;
use shared_utils::clock::FixedClock;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// Clock pinned to Monday 2026-03-02; bookings target the following Monday.
const TODAY: (i32, u32, u32) = (2026, 3, 2);
const NEXT_MONDAY_STR: &str = "2026-03-09";

struct TestApp {
    router: Router,
    secret: String,
    psychologist: TestUser,
    parent: TestUser,
    admin: TestUser,
    child_id: Uuid,
}

impl TestApp {
    async fn new() -> Self {
        let config = TestConfig::default();
        let secret = config.jwt_secret.clone();

        let directory = Arc::new(FamilyDirectory::new());
        let psych_record = directory
            .register_psychologist("Dra. Ana Torres", "ana.torres@crecer.pe")
            .await;
        let parent_record = directory
            .register_parent("Luis Fernandez", "luis.fernandez@example.com")
            .await;
        let child = directory
            .register_child(parent_record.id, "Valentina Fernandez", d(2018, 6, 15))
            .await
            .unwrap();

        let state = Arc::new(SchedulingState::new(
            config.to_arc(),
            directory,
            Arc::new(FixedClock::new(d(TODAY.0, TODAY.1, TODAY.2))),
        ));
        let router = scheduling_routes(state);

        Self {
            router,
            secret,
            psychologist: TestUser {
                id: psych_record.id,
                email: psych_record.email,
                role: Role::Psychologist,
            },
            parent: TestUser {
                id: parent_record.id,
                email: parent_record.email,
                role: Role::Parent,
            },
            admin: TestUser::admin("admin@crecer.pe"),
            child_id: child.id,
        }
    }

    fn token(&self, user: &TestUser) -> String {
        JwtTestUtils::create_test_token(user, &self.secret, None)
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token(user)),
            );
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn send_text(
        &self,
        method: Method,
        uri: &str,
        user: &TestUser,
        text: &str,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token(user)),
            )
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(text.to_string()))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn open_mondays(&self) {
        let (status, _) = self
            .send(
                Method::POST,
                "/availability",
                Some(&self.psychologist),
                Some(json!({
                    "psychologistId": self.psychologist.id,
                    "dayOfWeek": "MONDAY",
                    "startTime": "09:00",
                    "endTime": "12:00"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    async fn book(&self, start: &str, end: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/appointments/direct",
            Some(&self.parent),
            Some(json!({
                "childId": self.child_id,
                "psychologistId": self.psychologist.id,
                "date": NEXT_MONDAY_STR,
                "startTime": start,
                "endTime": end,
                "reason": "Evaluacion inicial"
            })),
        )
        .await
    }
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let app = TestApp::new().await;

    let uri = format!(
        "/availability?psychologistId={}&date={}",
        app.psychologist.id, NEXT_MONDAY_STR
    );
    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_token_is_unauthorized() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/appointments")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", JwtTestUtils::create_malformed_token()),
        )
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_day_availability_wire_format() {
    let app = TestApp::new().await;
    app.open_mondays().await;

    let uri = format!(
        "/availability?psychologistId={}&date={}",
        app.psychologist.id, NEXT_MONDAY_STR
    );
    let (status, body) = app.send(Method::GET, &uri, Some(&app.parent), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["psychologistId"], json!(app.psychologist.id));
    assert_eq!(body["psychologistName"], json!("Dra. Ana Torres"));
    assert_eq!(body["date"], json!(NEXT_MONDAY_STR));
    assert_eq!(
        body["horariosDisponibles"],
        json!(["09:00", "09:30", "10:00", "10:30", "11:00"])
    );
    assert_eq!(body["totalSlots"], json!(5));
    assert_eq!(body["slotsOcupados"], json!(0));
    assert_eq!(body["slotsDisponibles"], json!(5));
}

#[tokio::test]
async fn test_day_availability_reflects_bookings() {
    let app = TestApp::new().await;
    app.open_mondays().await;

    let (status, _) = app.book("10:00", "11:00").await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!(
        "/availability?psychologistId={}&date={}",
        app.psychologist.id, NEXT_MONDAY_STR
    );
    let (_, body) = app.send(Method::GET, &uri, Some(&app.parent), None).await;

    assert_eq!(body["horariosDisponibles"], json!(["09:00", "11:00"]));
    assert_eq!(body["totalSlots"], json!(5));
    assert_eq!(body["slotsOcupados"], json!(3));
    assert_eq!(body["slotsDisponibles"], json!(2));
}

#[tokio::test]
async fn test_day_availability_unknown_psychologist_is_not_found() {
    let app = TestApp::new().await;

    let uri = format!(
        "/availability?psychologistId={}&date={}",
        Uuid::new_v4(),
        NEXT_MONDAY_STR
    );
    let (status, _) = app.send(Method::GET, &uri, Some(&app.parent), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upsert_window_requires_schedule_ownership() {
    let app = TestApp::new().await;

    let body = json!({
        "psychologistId": app.psychologist.id,
        "dayOfWeek": "MONDAY",
        "startTime": "09:00",
        "endTime": "12:00"
    });

    let (status, _) = app
        .send(Method::POST, "/availability", Some(&app.parent), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admins may manage anyone's schedule.
    let (status, response) = app
        .send(Method::POST, "/availability", Some(&app.admin), Some(body))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], json!(true));
    assert_eq!(response["window"]["dayOfWeek"], json!("MONDAY"));
    assert_eq!(response["window"]["startTime"], json!("09:00"));
}

#[tokio::test]
async fn test_upsert_window_invalid_range_is_bad_request() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(
            Method::POST,
            "/availability",
            Some(&app.psychologist),
            Some(json!({
                "psychologistId": app.psychologist.id,
                "dayOfWeek": "MONDAY",
                "startTime": "12:00",
                "endTime": "09:00"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_windows_and_remove() {
    let app = TestApp::new().await;
    app.open_mondays().await;

    let uri = format!("/availability/windows?psychologistId={}", app.psychologist.id);
    let (status, body) = app
        .send(Method::GET, &uri, Some(&app.psychologist), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!(1));

    let window_id = body["windows"][0]["id"].as_str().unwrap().to_string();
    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/availability/{}", window_id),
            Some(&app.psychologist),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Idempotent delete.
    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/availability/{}", window_id),
            Some(&app.psychologist),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app
        .send(Method::GET, &uri, Some(&app.psychologist), None)
        .await;
    assert_eq!(body["total"], json!(0));
}

#[tokio::test]
async fn test_remove_window_of_another_psychologist_is_forbidden() {
    let app = TestApp::new().await;
    app.open_mondays().await;

    let uri = format!("/availability/windows?psychologistId={}", app.psychologist.id);
    let (_, body) = app
        .send(Method::GET, &uri, Some(&app.psychologist), None)
        .await;
    let window_id = body["windows"][0]["id"].as_str().unwrap().to_string();

    let intruder = TestUser::psychologist("otro@crecer.pe");
    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/availability/{}", window_id),
            Some(&intruder),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_change_window_day_endpoint() {
    let app = TestApp::new().await;
    app.open_mondays().await;

    let (status, body) = app
        .send(
            Method::PATCH,
            "/availability/day",
            Some(&app.psychologist),
            Some(json!({
                "psychologistId": app.psychologist.id,
                "oldDay": "MONDAY",
                "window": {
                    "dayOfWeek": "FRIDAY",
                    "startTime": "10:00",
                    "endTime": "13:00"
                }
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["window"]["dayOfWeek"], json!("FRIDAY"));

    // The Monday window no longer resolves.
    let uri = format!(
        "/availability?psychologistId={}&date={}",
        app.psychologist.id, NEXT_MONDAY_STR
    );
    let (_, body) = app.send(Method::GET, &uri, Some(&app.parent), None).await;
    assert_eq!(body["totalSlots"], json!(0));
}

#[tokio::test]
async fn test_hour_options_include_end_boundary() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::GET,
            "/availability/hours?startTime=09:00&endTime=10:30",
            Some(&app.psychologist),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hours"], json!(["09:00", "09:30", "10:00", "10:30"]));
}

#[tokio::test]
async fn test_direct_booking_happy_path_and_conflict() {
    let app = TestApp::new().await;
    app.open_mondays().await;

    let (status, body) = app.book("10:00", "11:00").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("Pending"));
    assert_eq!(body["startTime"], json!("10:00"));
    assert_eq!(body["endTime"], json!("11:00"));
    assert_eq!(body["parentId"], json!(app.parent.id));

    let (status, _) = app.book("10:00", "11:00").await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_direct_booking_past_date_is_bad_request() {
    let app = TestApp::new().await;
    app.open_mondays().await;

    let (status, _) = app
        .send(
            Method::POST,
            "/appointments/direct",
            Some(&app.parent),
            Some(json!({
                "childId": app.child_id,
                "psychologistId": app.psychologist.id,
                "date": "2026-02-23",
                "startTime": "10:00",
                "endTime": "11:00",
                "reason": "Evaluacion inicial"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_transitions_over_http() {
    let app = TestApp::new().await;
    app.open_mondays().await;

    let (_, appointment) = app.book("10:00", "11:00").await;
    let id = appointment["id"].as_str().unwrap().to_string();

    // A parent cannot confirm.
    let uri = format!("/appointments/{}/status?status=Confirmed", id);
    let (status, _) = app.send(Method::PATCH, &uri, Some(&app.parent), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The attending psychologist can, and the legacy Spanish label works.
    let uri = format!("/appointments/{}/status?status=Confirmada", id);
    let (status, body) = app
        .send(Method::PATCH, &uri, Some(&app.psychologist), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("Confirmed"));

    // Confirming again is an invalid transition.
    let uri = format!("/appointments/{}/status?status=Confirmed", id);
    let (status, _) = app
        .send(Method::PATCH, &uri, Some(&app.psychologist), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The parent cancels their own appointment.
    let uri = format!("/appointments/{}/status?status=Cancelled", id);
    let (status, body) = app.send(Method::PATCH, &uri, Some(&app.parent), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("Cancelled"));
}

#[tokio::test]
async fn test_status_completed_is_routed_to_finalize() {
    let app = TestApp::new().await;
    app.open_mondays().await;

    let (_, appointment) = app.book("10:00", "11:00").await;
    let id = appointment["id"].as_str().unwrap().to_string();

    let uri = format!("/appointments/{}/status?status=Completed", id);
    let (status, _) = app
        .send(Method::PATCH, &uri, Some(&app.psychologist), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_finalize_with_plain_text_findings() {
    let app = TestApp::new().await;
    app.open_mondays().await;

    // Book for today (2026-03-02 is a Monday) so the date check passes.
    let (status, appointment) = app
        .send(
            Method::POST,
            "/appointments/direct",
            Some(&app.parent),
            Some(json!({
                "childId": app.child_id,
                "psychologistId": app.psychologist.id,
                "date": "2026-03-02",
                "startTime": "09:00",
                "endTime": "10:00",
                "reason": "Evaluacion inicial"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = appointment["id"].as_str().unwrap().to_string();

    let uri = format!("/appointments/{}/status?status=Confirmed", id);
    let (status, _) = app
        .send(Method::PATCH, &uri, Some(&app.psychologist), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Only the attending psychologist may finalize.
    let uri = format!("/appointments/{}/finalize", id);
    let (status, _) = app
        .send_text(Method::PATCH, &uri, &app.parent, "El nino participo bien.")
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Empty findings are rejected.
    let (status, _) = app
        .send_text(Method::PATCH, &uri, &app.psychologist, "   ")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send_text(Method::PATCH, &uri, &app.psychologist, "El nino participo bien.")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("Completed"));
    assert_eq!(body["findings"], json!("El nino participo bien."));
}

#[tokio::test]
async fn test_list_appointments_is_scoped_by_role() {
    let app = TestApp::new().await;
    app.open_mondays().await;
    app.book("10:00", "11:00").await;

    let (status, body) = app
        .send(Method::GET, "/appointments", Some(&app.parent), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!(1));

    // A different parent sees nothing.
    let stranger = TestUser::parent("otra.madre@example.com");
    let (_, body) = app
        .send(Method::GET, "/appointments", Some(&stranger), None)
        .await;
    assert_eq!(body["total"], json!(0));

    // The attending psychologist and the admin both see it.
    let (_, body) = app
        .send(Method::GET, "/appointments", Some(&app.psychologist), None)
        .await;
    assert_eq!(body["total"], json!(1));
    let (_, body) = app
        .send(Method::GET, "/appointments", Some(&app.admin), None)
        .await;
    assert_eq!(body["total"], json!(1));
}
