//! Integration tests for student leave requests and mentor decisions.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    create_logged_in, get_request_with_auth, json_request_with_auth, request_with_auth, send,
    setup, UserSpec,
};
use domain::models::UserRole;
use serde_json::json;

fn leave_body() -> serde_json::Value {
    json!({
        "type": "MEDICAL",
        "start_date": "2024-03-11",
        "end_date": "2024-03-12",
        "reason": "Viral fever"
    })
}

#[tokio::test]
async fn test_mentor_decides_leave_once() {
    let Some(ctx) = setup().await else { return };
    let app = ctx.app();
    let (mentor, mentor_token) =
        create_logged_in(&ctx, &app, UserSpec::role(UserRole::Staff)).await;
    let (student, student_token) = create_logged_in(
        &ctx,
        &app,
        UserSpec::student("CSE", "II").mentored_by(mentor.id),
    )
    .await;

    let (status, leave) = send(
        &app,
        json_request_with_auth(Method::POST, "/api/v1/leaves", leave_body(), &student_token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(leave["student"], student.id.to_string());
    assert_eq!(leave["mentor"], mentor.id.to_string());
    assert_eq!(leave["status"], "PENDING");
    let id = leave["id"].as_str().unwrap();

    // The mentor sees the leave in their queue.
    let (_, queue) = send(&app, get_request_with_auth("/api/v1/leaves", &mentor_token)).await;
    assert_eq!(queue.as_array().unwrap().len(), 1);

    let approve = format!("/api/v1/leaves/{}/approve", id);
    let (status, approved) =
        send(&app, request_with_auth(Method::POST, &approve, &mentor_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "APPROVED");
    assert_eq!(approved["decided_by"], mentor.id.to_string());

    let (_, inbox) =
        send(&app, get_request_with_auth("/api/v1/notifications", &student_token)).await;
    let inbox = inbox.as_array().unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0]["type"], "LEAVE");
    assert_eq!(inbox[0]["message"], "Your leave request starting 2024-03-11 was approved.");

    let reject = format!("/api/v1/leaves/{}/reject", id);
    let (status, body) =
        send(&app, request_with_auth(Method::POST, &reject, &mentor_token)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_decided");

    // A decided leave can no longer be withdrawn.
    let uri = format!("/api/v1/leaves/{}", id);
    let (status, _) = send(&app, request_with_auth(Method::DELETE, &uri, &student_token)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_other_staff_cannot_decide() {
    let Some(ctx) = setup().await else { return };
    let app = ctx.app();
    let (mentor, _) = create_logged_in(&ctx, &app, UserSpec::role(UserRole::Staff)).await;
    let (_, stranger) = create_logged_in(&ctx, &app, UserSpec::role(UserRole::Staff)).await;
    let (_, hod) = create_logged_in(&ctx, &app, UserSpec::role(UserRole::Hod)).await;
    let (_, student_token) = create_logged_in(
        &ctx,
        &app,
        UserSpec::student("CSE", "II").mentored_by(mentor.id),
    )
    .await;

    let (_, leave) = send(
        &app,
        json_request_with_auth(Method::POST, "/api/v1/leaves", leave_body(), &student_token),
    )
    .await;
    let reject = format!("/api/v1/leaves/{}/reject", leave["id"].as_str().unwrap());

    // Outside the stranger's mentees, so not even visible.
    let (status, _) = send(&app, request_with_auth(Method::POST, &reject, &stranger)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, rejected) = send(&app, request_with_auth(Method::POST, &reject, &hod)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "REJECTED");
}

#[tokio::test]
async fn test_only_students_submit_and_edit_pending() {
    let Some(ctx) = setup().await else { return };
    let app = ctx.app();
    let (_, staff) = create_logged_in(&ctx, &app, UserSpec::role(UserRole::Staff)).await;
    let (_, student_token) = create_logged_in(&ctx, &app, UserSpec::student("CSE", "II")).await;

    let (status, _) = send(
        &app,
        json_request_with_auth(Method::POST, "/api/v1/leaves", leave_body(), &staff),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // End before start.
    let mut bad = leave_body();
    bad["end_date"] = json!("2024-03-01");
    let (status, _) = send(
        &app,
        json_request_with_auth(Method::POST, "/api/v1/leaves", bad, &student_token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // No mentor assigned yet: the leave is still filed.
    let (status, leave) = send(
        &app,
        json_request_with_auth(Method::POST, "/api/v1/leaves", leave_body(), &student_token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(leave["mentor"].is_null());

    let uri = format!("/api/v1/leaves/{}", leave["id"].as_str().unwrap());
    let (status, updated) = send(
        &app,
        json_request_with_auth(
            Method::PUT,
            &uri,
            json!({ "type": "PERSONAL", "reason": "Family function" }),
            &student_token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["type"], "PERSONAL");

    let (status, _) = send(&app, request_with_auth(Method::DELETE, &uri, &student_token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
