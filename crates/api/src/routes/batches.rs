//! Academic batch (cohort) routes and per-course curriculum status.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::batch::{
    CreateBatchRequest, CreateCurriculumRequest, ListCurriculumQuery, UpdateBatchRequest,
    UpdateCurriculumRequest,
};
use domain::models::attendance::FieldError;
use domain::models::{AcademicBatch, BatchCourseCurriculum};
use domain::services::{authorize, Action};
use persistence::repositories::BatchRepository;
use shared::validation::validate_year_span;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// Year span after applying a partial update to the stored batch.
fn check_merged_years(stored: &AcademicBatch, req: &UpdateBatchRequest) -> Result<(), ApiError> {
    let start = req.start_year.unwrap_or(stored.start_year);
    let end = req.end_year.unwrap_or(stored.end_year);
    validate_year_span(start, end).map_err(|e| {
        ApiError::InvalidInput(vec![FieldError {
            field: "end_year".into(),
            message: e
                .message
                .map(|m| m.to_string())
                .unwrap_or_else(|| e.code.to_string()),
        }])
    })
}

/// GET /api/v1/batches
pub async fn list_batches(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> Result<Json<Vec<AcademicBatch>>, ApiError> {
    let batches = BatchRepository::new(state.pool.clone()).list().await?;
    Ok(Json(batches.into_iter().map(AcademicBatch::from).collect()))
}

/// GET /api/v1/batches/:id
pub async fn get_batch(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AcademicBatch>, ApiError> {
    let batch = BatchRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Batch not found".into()))?;
    Ok(Json(batch.into()))
}

/// POST /api/v1/batches
pub async fn create_batch(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateBatchRequest>,
) -> Result<(StatusCode, Json<AcademicBatch>), ApiError> {
    authorize(&current.caller, Action::ManageCatalog)?;
    request.validate()?;

    let batch = BatchRepository::new(state.pool.clone())
        .create(&request)
        .await?;

    info!(
        batch_id = %batch.id,
        name = %batch.name,
        course_count = request.courses.len(),
        "Batch created"
    );
    Ok((StatusCode::CREATED, Json(batch.into())))
}

/// PUT /api/v1/batches/:id
pub async fn update_batch(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBatchRequest>,
) -> Result<Json<AcademicBatch>, ApiError> {
    authorize(&current.caller, Action::ManageCatalog)?;
    request.validate()?;

    let repo = BatchRepository::new(state.pool.clone());
    let stored: AcademicBatch = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Batch not found".into()))?
        .into();
    check_merged_years(&stored, &request)?;

    let batch = repo
        .update(id, &request)
        .await?
        .ok_or_else(|| ApiError::NotFound("Batch not found".into()))?;

    info!(batch_id = %id, "Batch updated");
    Ok(Json(batch.into()))
}

/// DELETE /api/v1/batches/:id
pub async fn delete_batch(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&current.caller, Action::ManageCatalog)?;

    if BatchRepository::new(state.pool.clone()).delete(id).await? == 0 {
        return Err(ApiError::NotFound("Batch not found".into()));
    }

    info!(batch_id = %id, "Batch deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/curriculum-status
pub async fn list_curricula(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(query): Query<ListCurriculumQuery>,
) -> Result<Json<Vec<BatchCourseCurriculum>>, ApiError> {
    let rows = BatchRepository::new(state.pool.clone())
        .list_curricula(&query)
        .await?;
    Ok(Json(rows.into_iter().map(BatchCourseCurriculum::from).collect()))
}

/// GET /api/v1/curriculum-status/:id
pub async fn get_curriculum(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BatchCourseCurriculum>, ApiError> {
    let row = BatchRepository::new(state.pool.clone())
        .find_curriculum(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Curriculum not found".into()))?;
    Ok(Json(row.into()))
}

/// POST /api/v1/curriculum-status
pub async fn create_curriculum(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateCurriculumRequest>,
) -> Result<(StatusCode, Json<BatchCourseCurriculum>), ApiError> {
    authorize(&current.caller, Action::ToggleCurriculum)?;

    let row = BatchRepository::new(state.pool.clone())
        .create_curriculum(request.batch, request.course, request.status)
        .await?;

    info!(
        curriculum_id = %row.id,
        batch_id = %request.batch,
        course_id = %request.course,
        status = ?request.status,
        "Curriculum status created"
    );
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// Toggle a curriculum between EDITABLE and FROZEN.
///
/// PUT /api/v1/curriculum-status/:id
pub async fn update_curriculum(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCurriculumRequest>,
) -> Result<Json<BatchCourseCurriculum>, ApiError> {
    authorize(&current.caller, Action::ToggleCurriculum)?;

    let row = BatchRepository::new(state.pool.clone())
        .set_curriculum_status(id, request.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Curriculum not found".into()))?;

    info!(
        curriculum_id = %id,
        status = ?request.status,
        changed_by = %current.id(),
        "Curriculum status changed"
    );
    Ok(Json(row.into()))
}

/// DELETE /api/v1/curriculum-status/:id
pub async fn delete_curriculum(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&current.caller, Action::ToggleCurriculum)?;

    if BatchRepository::new(state.pool.clone())
        .delete_curriculum(id)
        .await?
        == 0
    {
        return Err(ApiError::NotFound("Curriculum not found".into()));
    }

    info!(curriculum_id = %id, "Curriculum status deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::BatchType;

    fn stored() -> AcademicBatch {
        AcademicBatch {
            id: Uuid::new_v4(),
            name: "2024-2028".into(),
            start_year: 2024,
            end_year: 2028,
            batch_type: BatchType::Ug,
            courses: vec![],
        }
    }

    #[test]
    fn test_merged_years_checked_against_stored_row() {
        let ok = UpdateBatchRequest {
            end_year: Some(2027),
            ..Default::default()
        };
        assert!(check_merged_years(&stored(), &ok).is_ok());

        let bad = UpdateBatchRequest {
            start_year: Some(2030),
            ..Default::default()
        };
        match check_merged_years(&stored(), &bad) {
            Err(ApiError::InvalidInput(fields)) => assert_eq!(fields[0].field, "end_year"),
            other => panic!("unexpected: {:?}", other.err()),
        }
    }
}
