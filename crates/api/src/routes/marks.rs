//! Mark batches and the scores recorded under them.
//!
//! Scores can only change while their batch is OPEN; the repository takes a
//! share lock on the batch row so a concurrent freeze cannot interleave.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::attendance::FieldError;
use domain::models::mark::{
    CreateMarkBatchRequest, CreateMarkRecordRequest, ListMarkBatchesQuery, ListMarkRecordsQuery,
    MarkBatchDetail, UpdateMarkBatchRequest, UpdateMarkRecordRequest,
};
use domain::models::{MarkBatch, MarkRecord};
use domain::services::{authorize, scope, Action, RecordScope, Resource};
use persistence::repositories::MarkRepository;
use shared::validation::validate_score;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::middleware::metrics::record_marks_recorded;

/// GET /api/v1/mark-batches
pub async fn list_batches(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(query): Query<ListMarkBatchesQuery>,
) -> Result<Json<Vec<MarkBatch>>, ApiError> {
    let batches = MarkRepository::new(state.pool.clone())
        .list_batches(query.status)
        .await?;
    Ok(Json(batches.into_iter().map(MarkBatch::from).collect()))
}

/// Batch with the records the caller may see.
///
/// GET /api/v1/mark-batches/:id
pub async fn get_batch(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MarkBatchDetail>, ApiError> {
    let repo = MarkRepository::new(state.pool.clone());
    let batch = repo
        .find_batch(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Mark batch not found".into()))?;

    let query = ListMarkRecordsQuery {
        batch: Some(id),
        ..Default::default()
    };
    let records = repo
        .list_records(&scope(&current.caller, Resource::MarkRecords), &query)
        .await?;

    Ok(Json(MarkBatchDetail {
        batch: batch.into(),
        records: records.into_iter().map(MarkRecord::from).collect(),
    }))
}

/// POST /api/v1/mark-batches
pub async fn create_batch(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateMarkBatchRequest>,
) -> Result<(StatusCode, Json<MarkBatch>), ApiError> {
    authorize(&current.caller, Action::ManageMarkBatches)?;
    request.validate()?;

    let batch = MarkRepository::new(state.pool.clone())
        .create_batch(&request)
        .await?;

    info!(
        batch_id = %batch.id,
        name = %batch.name,
        academic_year = %batch.academic_year,
        subject_count = batch.subjects.len(),
        "Mark batch created"
    );
    Ok((StatusCode::CREATED, Json(batch.into())))
}

/// PUT /api/v1/mark-batches/:id
///
/// Status may only move forward: OPEN, then FROZEN, then BLOCKED.
pub async fn update_batch(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMarkBatchRequest>,
) -> Result<Json<MarkBatch>, ApiError> {
    authorize(&current.caller, Action::ManageMarkBatches)?;
    request.validate()?;

    let batch = MarkRepository::new(state.pool.clone())
        .update_batch(id, &request)
        .await?;

    info!(batch_id = %id, status = %batch.status, "Mark batch updated");
    Ok(Json(batch.into()))
}

/// DELETE /api/v1/mark-batches/:id
pub async fn delete_batch(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&current.caller, Action::ManageMarkBatches)?;

    if MarkRepository::new(state.pool.clone()).delete_batch(id).await? == 0 {
        return Err(ApiError::NotFound("Mark batch not found".into()));
    }

    info!(batch_id = %id, deleted_by = %current.id(), "Mark batch deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/mark-records
pub async fn list_records(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListMarkRecordsQuery>,
) -> Result<Json<Vec<MarkRecord>>, ApiError> {
    let records = MarkRepository::new(state.pool.clone())
        .list_records(&scope(&current.caller, Resource::MarkRecords), &query)
        .await?;
    Ok(Json(records.into_iter().map(MarkRecord::from).collect()))
}

/// GET /api/v1/mark-records/:id
pub async fn get_record(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MarkRecord>, ApiError> {
    let record = MarkRepository::new(state.pool.clone())
        .find_record(id, &scope(&current.caller, Resource::MarkRecords))
        .await?
        .ok_or_else(|| ApiError::NotFound("Mark record not found".into()))?;
    Ok(Json(record.into()))
}

/// POST /api/v1/mark-records
pub async fn create_record(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateMarkRecordRequest>,
) -> Result<(StatusCode, Json<MarkRecord>), ApiError> {
    authorize(&current.caller, Action::EnterMarks)?;
    request.validate()?;

    let record = MarkRepository::new(state.pool.clone())
        .create_record(&request, current.id())
        .await?;
    record_marks_recorded();

    info!(
        record_id = %record.id,
        batch_id = %record.batch_id,
        student_id = %record.student_id,
        subject_id = %record.subject_id,
        "Marks recorded"
    );
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Score after applying a partial update to the stored record.
fn check_merged_score(stored: &MarkRecord, req: &UpdateMarkRecordRequest) -> Result<(), ApiError> {
    let marks = req.marks.unwrap_or(stored.marks);
    let max_marks = req.max_marks.unwrap_or(stored.max_marks);
    validate_score(marks, max_marks).map_err(|e| {
        ApiError::InvalidInput(vec![FieldError {
            field: "marks".into(),
            message: e
                .message
                .map(|m| m.to_string())
                .unwrap_or_else(|| e.code.to_string()),
        }])
    })
}

/// PUT /api/v1/mark-records/:id
pub async fn update_record(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMarkRecordRequest>,
) -> Result<Json<MarkRecord>, ApiError> {
    authorize(&current.caller, Action::EnterMarks)?;

    let repo = MarkRepository::new(state.pool.clone());
    let stored: MarkRecord = repo
        .find_record(id, &RecordScope::All)
        .await?
        .ok_or_else(|| ApiError::NotFound("Mark record not found".into()))?
        .into();
    check_merged_score(&stored, &request)?;

    let record = repo
        .update_record(id, request.marks, request.max_marks, current.id())
        .await?;
    record_marks_recorded();

    info!(
        record_id = %id,
        marks = record.marks,
        max_marks = record.max_marks,
        updated_by = %current.id(),
        "Marks updated"
    );
    Ok(Json(record.into()))
}

/// DELETE /api/v1/mark-records/:id
pub async fn delete_record(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&current.caller, Action::EnterMarks)?;

    MarkRepository::new(state.pool.clone())
        .delete_record(id)
        .await?;

    info!(record_id = %id, deleted_by = %current.id(), "Mark record deleted");
    Ok(StatusCode::NO_CONTENT)
}
