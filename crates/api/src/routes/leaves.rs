//! Student leave requests, routed to the student's mentor for a decision.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::approval::StatusQuery;
use domain::models::leave::{CreateLeaveRequest, UpdateLeaveRequest};
use domain::models::{Decision, LeaveRequest};
use domain::services::{authorize, scope, Action, Resource};
use persistence::entities::LeaveEntity;
use persistence::repositories::LeaveRepository;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::middleware::metrics::record_workflow_decision;

async fn find_visible(
    repo: &LeaveRepository,
    current: &CurrentUser,
    id: Uuid,
) -> Result<LeaveEntity, ApiError> {
    repo.find_by_id(id, &scope(&current.caller, Resource::Leaves))
        .await?
        .ok_or_else(|| ApiError::NotFound("Leave request not found".into()))
}

/// GET /api/v1/leaves
pub async fn list_leaves(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<LeaveRequest>>, ApiError> {
    let leaves = LeaveRepository::new(state.pool.clone())
        .list(&scope(&current.caller, Resource::Leaves), query.status)
        .await?;
    Ok(Json(leaves.into_iter().map(LeaveRequest::from).collect()))
}

/// GET /api/v1/leaves/:id
pub async fn get_leave(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LeaveRequest>, ApiError> {
    let repo = LeaveRepository::new(state.pool.clone());
    Ok(Json(find_visible(&repo, &current, id).await?.into()))
}

/// POST /api/v1/leaves
///
/// The request is routed to the mentor on the student's profile at
/// submission time.
pub async fn create_leave(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateLeaveRequest>,
) -> Result<(StatusCode, Json<LeaveRequest>), ApiError> {
    authorize(&current.caller, Action::SubmitLeave)?;
    request.validate()?;

    let leave = LeaveRepository::new(state.pool.clone())
        .create(current.id(), current.user.mentor_id, &request)
        .await?;

    info!(
        leave_id = %leave.id,
        student_id = %current.id(),
        mentor_id = ?leave.mentor_id,
        leave_type = ?leave.leave_type,
        "Leave requested"
    );
    Ok((StatusCode::CREATED, Json(leave.into())))
}

/// PUT /api/v1/leaves/:id
pub async fn update_leave(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateLeaveRequest>,
) -> Result<Json<LeaveRequest>, ApiError> {
    let repo = LeaveRepository::new(state.pool.clone());
    let existing = find_visible(&repo, &current, id).await?;
    authorize(
        &current.caller,
        Action::WithdrawLeave {
            owner: existing.student_id,
        },
    )?;
    request.validate()?;

    let leave = repo.update_pending(id, &request).await?;

    info!(leave_id = %id, "Leave request updated");
    Ok(Json(leave.into()))
}

/// DELETE /api/v1/leaves/:id
///
/// Only pending requests can be withdrawn.
pub async fn delete_leave(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = LeaveRepository::new(state.pool.clone());
    let existing = find_visible(&repo, &current, id).await?;
    authorize(
        &current.caller,
        Action::WithdrawLeave {
            owner: existing.student_id,
        },
    )?;

    repo.delete_pending(id).await?;

    info!(leave_id = %id, "Leave request withdrawn");
    Ok(StatusCode::NO_CONTENT)
}

async fn decide(
    state: &AppState,
    current: &CurrentUser,
    id: Uuid,
    decision: Decision,
) -> Result<LeaveRequest, ApiError> {
    let repo = LeaveRepository::new(state.pool.clone());
    let existing = find_visible(&repo, current, id).await?;
    authorize(
        &current.caller,
        Action::DecideLeave {
            mentor: existing.mentor_id,
        },
    )?;

    let leave = repo.decide(id, decision, current.id()).await?;
    record_workflow_decision("leave", decision.as_str());

    info!(
        leave_id = %id,
        decided_by = %current.id(),
        status = %leave.status,
        "Leave request decided"
    );
    Ok(leave.into())
}

/// POST /api/v1/leaves/:id/approve
pub async fn approve_leave(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LeaveRequest>, ApiError> {
    Ok(Json(decide(&state, &current, id, Decision::Approve).await?))
}

/// POST /api/v1/leaves/:id/reject
pub async fn reject_leave(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LeaveRequest>, ApiError> {
    Ok(Json(decide(&state, &current, id, Decision::Reject).await?))
}
