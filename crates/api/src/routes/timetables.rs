//! Department timetable routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::timetable::{
    CreateTimetableRequest, ListTimetablesQuery, UpdateTimetableRequest,
};
use domain::models::Timetable;
use domain::services::{authorize, Action};
use persistence::repositories::TimetableRepository;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// GET /api/v1/timetables
pub async fn list_timetables(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(query): Query<ListTimetablesQuery>,
) -> Result<Json<Vec<Timetable>>, ApiError> {
    let timetables = TimetableRepository::new(state.pool.clone())
        .list(&query)
        .await?;
    Ok(Json(timetables.into_iter().map(Timetable::from).collect()))
}

/// GET /api/v1/timetables/:id
pub async fn get_timetable(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Timetable>, ApiError> {
    let timetable = TimetableRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Timetable not found".into()))?;
    Ok(Json(timetable.into()))
}

/// POST /api/v1/timetables
pub async fn create_timetable(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateTimetableRequest>,
) -> Result<(StatusCode, Json<Timetable>), ApiError> {
    authorize(&current.caller, Action::ManageTimetables)?;
    request.validate()?;

    let timetable = TimetableRepository::new(state.pool.clone())
        .create(&request)
        .await?;

    info!(
        timetable_id = %timetable.id,
        department = %timetable.department,
        study_year = %timetable.study_year,
        hours = request.assignments.len(),
        "Timetable created"
    );
    Ok((StatusCode::CREATED, Json(timetable.into())))
}

/// PUT /api/v1/timetables/:id
pub async fn update_timetable(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTimetableRequest>,
) -> Result<Json<Timetable>, ApiError> {
    authorize(&current.caller, Action::ManageTimetables)?;
    request.validate()?;

    let timetable = TimetableRepository::new(state.pool.clone())
        .update(id, &request)
        .await?
        .ok_or_else(|| ApiError::NotFound("Timetable not found".into()))?;

    info!(timetable_id = %id, updated_by = %current.id(), "Timetable updated");
    Ok(Json(timetable.into()))
}

/// DELETE /api/v1/timetables/:id
pub async fn delete_timetable(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&current.caller, Action::ManageTimetables)?;

    if TimetableRepository::new(state.pool.clone()).delete(id).await? == 0 {
        return Err(ApiError::NotFound("Timetable not found".into()));
    }

    info!(timetable_id = %id, "Timetable deleted");
    Ok(StatusCode::NO_CONTENT)
}
