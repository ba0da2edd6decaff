//! Curriculum edit requests. Approving one reopens the batch curriculum for
//! the course in the same transaction.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::approval::StatusQuery;
use domain::models::curriculum::{CreateCurriculumEditRequest, UpdateCurriculumEditRequest};
use domain::models::{CurriculumEditRequest, Decision};
use domain::services::{authorize, Action};
use persistence::entities::CurriculumRequestEntity;
use persistence::repositories::CurriculumRequestRepository;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::middleware::metrics::record_workflow_decision;

async fn find(
    repo: &CurriculumRequestRepository,
    id: Uuid,
) -> Result<CurriculumRequestEntity, ApiError> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Curriculum request not found".into()))
}

/// GET /api/v1/curriculum-requests
pub async fn list_requests(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<CurriculumEditRequest>>, ApiError> {
    let rows = CurriculumRequestRepository::new(state.pool.clone())
        .list(query.status)
        .await?;
    Ok(Json(rows.into_iter().map(CurriculumEditRequest::from).collect()))
}

/// GET /api/v1/curriculum-requests/:id
pub async fn get_request(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CurriculumEditRequest>, ApiError> {
    let repo = CurriculumRequestRepository::new(state.pool.clone());
    Ok(Json(find(&repo, id).await?.into()))
}

/// POST /api/v1/curriculum-requests
///
/// Fails with a state conflict when the curriculum is already editable.
pub async fn create_request(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateCurriculumEditRequest>,
) -> Result<(StatusCode, Json<CurriculumEditRequest>), ApiError> {
    authorize(&current.caller, Action::RequestCurriculumEdit)?;
    request.validate()?;

    let row = CurriculumRequestRepository::new(state.pool.clone())
        .create(current.id(), request.batch, request.course, &request.reason)
        .await?;

    info!(
        request_id = %row.id,
        hod_id = %current.id(),
        batch_id = %request.batch,
        course_id = %request.course,
        "Curriculum edit requested"
    );
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// PUT /api/v1/curriculum-requests/:id
pub async fn update_request(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCurriculumEditRequest>,
) -> Result<Json<CurriculumEditRequest>, ApiError> {
    let repo = CurriculumRequestRepository::new(state.pool.clone());
    let existing = find(&repo, id).await?;
    authorize(
        &current.caller,
        Action::WithdrawCurriculumEdit {
            requester: existing.hod_id,
        },
    )?;
    request.validate()?;

    let row = repo.update_reason(id, &request.reason).await?;

    info!(request_id = %id, "Curriculum edit request updated");
    Ok(Json(row.into()))
}

/// DELETE /api/v1/curriculum-requests/:id
pub async fn delete_request(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = CurriculumRequestRepository::new(state.pool.clone());
    let existing = find(&repo, id).await?;
    authorize(
        &current.caller,
        Action::WithdrawCurriculumEdit {
            requester: existing.hod_id,
        },
    )?;

    repo.delete(id).await?;

    info!(request_id = %id, deleted_by = %current.id(), "Curriculum edit request deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn decide(
    state: &AppState,
    current: &CurrentUser,
    id: Uuid,
    decision: Decision,
) -> Result<CurriculumEditRequest, ApiError> {
    authorize(&current.caller, Action::DecideCurriculumEdit)?;

    let row = CurriculumRequestRepository::new(state.pool.clone())
        .decide(id, decision, current.id())
        .await?;
    record_workflow_decision("curriculum_edit", decision.as_str());

    info!(
        request_id = %id,
        decided_by = %current.id(),
        status = %row.status,
        batch_id = %row.batch_id,
        course_id = %row.course_id,
        "Curriculum edit request decided"
    );
    Ok(row.into())
}

/// POST /api/v1/curriculum-requests/:id/approve
pub async fn approve_request(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CurriculumEditRequest>, ApiError> {
    Ok(Json(decide(&state, &current, id, Decision::Approve).await?))
}

/// POST /api/v1/curriculum-requests/:id/reject
pub async fn reject_request(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CurriculumEditRequest>, ApiError> {
    Ok(Json(decide(&state, &current, id, Decision::Reject).await?))
}
