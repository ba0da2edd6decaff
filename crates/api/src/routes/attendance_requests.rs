//! Attendance edit requests and their three-way approval.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::approval::StatusQuery;
use domain::models::attendance::{CreateAttendanceEditRequest, UpdateAttendanceEditRequest};
use domain::models::{AttendanceEditRequest, Decision};
use domain::services::{authorize, scope, Action, ApprovalFlag, Resource};
use persistence::entities::AttendanceEditEntity;
use persistence::repositories::AttendanceRequestRepository;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::middleware::metrics::record_workflow_decision;

async fn find_visible(
    repo: &AttendanceRequestRepository,
    current: &CurrentUser,
    id: Uuid,
) -> Result<AttendanceEditEntity, ApiError> {
    repo.find_by_id(id, &scope(&current.caller, Resource::AttendanceRequests))
        .await?
        .ok_or_else(|| ApiError::NotFound("Attendance request not found".into()))
}

/// GET /api/v1/attendance-requests
pub async fn list_requests(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<AttendanceEditRequest>>, ApiError> {
    let rows = AttendanceRequestRepository::new(state.pool.clone())
        .list(&scope(&current.caller, Resource::AttendanceRequests), query.status)
        .await?;
    Ok(Json(rows.into_iter().map(AttendanceEditRequest::from).collect()))
}

/// GET /api/v1/attendance-requests/:id
pub async fn get_request(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AttendanceEditRequest>, ApiError> {
    let repo = AttendanceRequestRepository::new(state.pool.clone());
    Ok(Json(find_visible(&repo, &current, id).await?.into()))
}

/// POST /api/v1/attendance-requests
pub async fn create_request(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateAttendanceEditRequest>,
) -> Result<(StatusCode, Json<AttendanceEditRequest>), ApiError> {
    authorize(&current.caller, Action::RequestAttendanceEdit)?;
    request.validate()?;

    let row = AttendanceRequestRepository::new(state.pool.clone())
        .create(current.id(), request.date, &request.reason)
        .await?;

    info!(
        request_id = %row.id,
        requester_id = %current.id(),
        date = %row.date,
        "Attendance edit requested"
    );
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// PUT /api/v1/attendance-requests/:id
///
/// Only pending requests can be edited.
pub async fn update_request(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAttendanceEditRequest>,
) -> Result<Json<AttendanceEditRequest>, ApiError> {
    let repo = AttendanceRequestRepository::new(state.pool.clone());
    let existing = find_visible(&repo, &current, id).await?;
    authorize(
        &current.caller,
        Action::WithdrawAttendanceEdit {
            requester: existing.requester_id,
        },
    )?;
    request.validate()?;

    let row = repo
        .update_pending(id, request.date, request.reason.as_deref())
        .await?;

    info!(request_id = %id, "Attendance edit request updated");
    Ok(Json(row.into()))
}

/// DELETE /api/v1/attendance-requests/:id
pub async fn delete_request(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = AttendanceRequestRepository::new(state.pool.clone());
    let existing = find_visible(&repo, &current, id).await?;
    authorize(
        &current.caller,
        Action::WithdrawAttendanceEdit {
            requester: existing.requester_id,
        },
    )?;

    repo.delete(id).await?;

    info!(request_id = %id, deleted_by = %current.id(), "Attendance edit request deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn decide(
    state: &AppState,
    current: &CurrentUser,
    id: Uuid,
    decision: Decision,
) -> Result<AttendanceEditRequest, ApiError> {
    authorize(&current.caller, Action::DecideAttendanceEdit)?;
    let flag = ApprovalFlag::for_role(current.caller.role).ok_or_else(|| {
        ApiError::Forbidden(
            "Only administrators, deans and HODs can decide attendance edits".into(),
        )
    })?;

    let row = AttendanceRequestRepository::new(state.pool.clone())
        .decide(id, flag, decision)
        .await?;
    record_workflow_decision("attendance_edit", decision.as_str());

    info!(
        request_id = %id,
        approver_id = %current.id(),
        flag = ?flag,
        decision = decision.as_str(),
        status = %row.status,
        "Attendance edit decision recorded"
    );
    Ok(row.into())
}

/// Record the caller's approval flag.
///
/// POST /api/v1/attendance-requests/:id/approve
///
/// The request becomes APPROVED once admin, dean and HOD have all approved.
pub async fn approve_request(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AttendanceEditRequest>, ApiError> {
    Ok(Json(decide(&state, &current, id, Decision::Approve).await?))
}

/// Reject the request outright.
///
/// POST /api/v1/attendance-requests/:id/reject
pub async fn reject_request(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AttendanceEditRequest>, ApiError> {
    Ok(Json(decide(&state, &current, id, Decision::Reject).await?))
}
