//! Integration tests for mark batches and the scores entered under them.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    create_logged_in, create_user, get_request_with_auth, json_request_with_auth,
    request_with_auth, send, setup, UserSpec,
};
use domain::models::UserRole;
use serde_json::{json, Value};

/// Creates a course with one subject (as `admin`) and an OPEN batch covering
/// it (as `token`).
async fn open_batch(app: &axum::Router, admin: &str, token: &str) -> (Value, Value) {
    let (_, course) = send(
        app,
        json_request_with_auth(
            Method::POST,
            "/api/v1/courses",
            json!({ "name": "Electronics", "degree": "B.E.", "domain": "Engineering" }),
            admin,
        ),
    )
    .await;
    let (_, subject) = send(
        app,
        json_request_with_auth(
            Method::POST,
            "/api/v1/subjects",
            json!({ "course": course["id"], "code": "EC301", "name": "Signals", "semester": 5 }),
            admin,
        ),
    )
    .await;
    let (status, batch) = send(
        app,
        json_request_with_auth(
            Method::POST,
            "/api/v1/mark-batches",
            json!({
                "name": "Model Exam",
                "academic_year": "2024-25",
                "subjects": [subject["id"]]
            }),
            token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(batch["status"], "OPEN");
    (batch, subject)
}

fn set_status(batch_id: &str, status: &str, token: &str) -> axum::http::Request<axum::body::Body> {
    json_request_with_auth(
        Method::PUT,
        &format!("/api/v1/mark-batches/{}", batch_id),
        json!({ "status": status }),
        token,
    )
}

#[tokio::test]
async fn test_batch_lifecycle_moves_forward_only() {
    let Some(ctx) = setup().await else { return };
    let app = ctx.app();
    let (_, admin) = create_logged_in(&ctx, &app, UserSpec::role(UserRole::Admin)).await;
    let (_, dean) = create_logged_in(&ctx, &app, UserSpec::role(UserRole::Dean)).await;
    let (batch, _) = open_batch(&app, &admin, &dean).await;
    let id = batch["id"].as_str().unwrap();

    let (status, frozen) = send(&app, set_status(id, "FROZEN", &dean)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(frozen["status"], "FROZEN");

    let (status, body) = send(&app, set_status(id, "OPEN", &dean)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "state_conflict");

    let (status, blocked) = send(&app, set_status(id, "BLOCKED", &dean)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(blocked["status"], "BLOCKED");

    let (_, open) =
        send(&app, get_request_with_auth("/api/v1/mark-batches?status=OPEN", &dean)).await;
    assert!(open.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_staff_cannot_manage_batches() {
    let Some(ctx) = setup().await else { return };
    let app = ctx.app();
    let (_, staff) = create_logged_in(&ctx, &app, UserSpec::role(UserRole::Staff)).await;

    let (status, _) = send(
        &app,
        json_request_with_auth(
            Method::POST,
            "/api/v1/mark-batches",
            json!({ "name": "Internal 2", "academic_year": "2024-25" }),
            &staff,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_records_locked_once_batch_frozen() {
    let Some(ctx) = setup().await else { return };
    let app = ctx.app();
    let (_, admin) = create_logged_in(&ctx, &app, UserSpec::role(UserRole::Admin)).await;
    let (_, hod) = create_logged_in(&ctx, &app, UserSpec::role(UserRole::Hod)).await;
    let (_, staff) = create_logged_in(&ctx, &app, UserSpec::role(UserRole::Staff)).await;
    let student = create_user(&ctx.pool, UserSpec::student("ECE", "III")).await;
    let (batch, subject) = open_batch(&app, &admin, &hod).await;
    let batch_id = batch["id"].as_str().unwrap();

    let (status, record) = send(
        &app,
        json_request_with_auth(
            Method::POST,
            "/api/v1/mark-records",
            json!({
                "batch": batch_id,
                "student": student.id,
                "subject": subject["id"],
                "marks": 42.5,
                "max_marks": 50
            }),
            &staff,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["max_marks"], 50.0);
    let record_uri = format!("/api/v1/mark-records/{}", record["id"].as_str().unwrap());

    // The merged score must stay within the stored maximum.
    let (status, body) = send(
        &app,
        json_request_with_auth(Method::PUT, &record_uri, json!({ "marks": 60 }), &staff),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "marks");

    let (status, updated) = send(
        &app,
        json_request_with_auth(Method::PUT, &record_uri, json!({ "marks": 45 }), &staff),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["marks"], 45.0);

    let (_, detail) = send(
        &app,
        get_request_with_auth(&format!("/api/v1/mark-batches/{}", batch_id), &hod),
    )
    .await;
    assert_eq!(detail["records"].as_array().unwrap().len(), 1);

    send(&app, set_status(batch_id, "FROZEN", &hod)).await;

    let (status, body) = send(
        &app,
        json_request_with_auth(Method::PUT, &record_uri, json!({ "marks": 40 }), &staff),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "state_conflict");

    let (status, _) = send(&app, request_with_auth(Method::DELETE, &record_uri, &staff)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        json_request_with_auth(
            Method::POST,
            "/api/v1/mark-records",
            json!({
                "batch": batch_id,
                "student": student.id,
                "subject": subject["id"],
                "marks": 10
            }),
            &staff,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_score_above_maximum_rejected() {
    let Some(ctx) = setup().await else { return };
    let app = ctx.app();
    let (_, admin) = create_logged_in(&ctx, &app, UserSpec::role(UserRole::Admin)).await;
    let student = create_user(&ctx.pool, UserSpec::student("ECE", "III")).await;
    let (batch, subject) = open_batch(&app, &admin, &admin).await;

    let (status, body) = send(
        &app,
        json_request_with_auth(
            Method::POST,
            "/api/v1/mark-records",
            json!({
                "batch": batch["id"],
                "student": student.id,
                "subject": subject["id"],
                "marks": 101
            }),
            &admin,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_student_sees_only_own_marks() {
    let Some(ctx) = setup().await else { return };
    let app = ctx.app();
    let (_, admin) = create_logged_in(&ctx, &app, UserSpec::role(UserRole::Admin)).await;
    let (me, token) = create_logged_in(&ctx, &app, UserSpec::student("ECE", "III")).await;
    let other = create_user(&ctx.pool, UserSpec::student("ECE", "III")).await;
    let (batch, subject) = open_batch(&app, &admin, &admin).await;

    for student in [me.id, other.id] {
        let (status, _) = send(
            &app,
            json_request_with_auth(
                Method::POST,
                "/api/v1/mark-records",
                json!({
                    "batch": batch["id"],
                    "student": student,
                    "subject": subject["id"],
                    "marks": 70
                }),
                &admin,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, list) = send(&app, get_request_with_auth("/api/v1/mark-records", &token)).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["student"], me.id.to_string());

    // Batch detail is scoped the same way.
    let (_, detail) = send(
        &app,
        get_request_with_auth(
            &format!("/api/v1/mark-batches/{}", batch["id"].as_str().unwrap()),
            &token,
        ),
    )
    .await;
    assert_eq!(detail["records"].as_array().unwrap().len(), 1);
}
