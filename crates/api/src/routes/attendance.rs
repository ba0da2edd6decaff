//! Attendance record routes.
//!
//! Day-level `is_present` is derived from the hour entries whenever a record
//! has any; see [`derive_presence`]. Records dated before today only change
//! under an approved attendance edit request.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::attendance::{
    BulkItemOutcome, CreateAttendanceRequest, FieldError, ListAttendanceQuery,
    UpdateAttendanceRequest,
};
use chrono::{NaiveDate, Utc};
use domain::models::AttendanceRecord;
use domain::services::{
    authorize, derive_presence, ensure_attendance_editable, scope, Action, Caller, RecordScope,
    Resource,
};
use persistence::repositories::{AttendanceRepository, AttendanceRequestRepository, NewAttendance};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::{field_errors, ApiError};
use crate::extractors::CurrentUser;
use crate::middleware::metrics::record_attendance_created;

/// GET /api/v1/attendance
pub async fn list_attendance(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListAttendanceQuery>,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError> {
    let records = AttendanceRepository::new(state.pool.clone())
        .list(&scope(&current.caller, Resource::Attendance), &query)
        .await?;
    Ok(Json(records.into_iter().map(AttendanceRecord::from).collect()))
}

/// GET /api/v1/attendance/:id
pub async fn get_attendance(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AttendanceRecord>, ApiError> {
    let record = AttendanceRepository::new(state.pool.clone())
        .find_by_id(id, &scope(&current.caller, Resource::Attendance))
        .await?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".into()))?;
    Ok(Json(record.into()))
}

/// Fails with a state conflict when `date` is in the past and the caller has
/// no approved edit request for it.
async fn check_edit_window(
    pool: &PgPool,
    caller: &Caller,
    date: NaiveDate,
) -> Result<(), ApiError> {
    let today = Utc::now().date_naive();
    if ensure_attendance_editable(caller.role, date, today, false).is_ok() {
        return Ok(());
    }
    let approved = AttendanceRequestRepository::new(pool.clone())
        .has_approved(caller.id, date)
        .await?;
    ensure_attendance_editable(caller.role, date, today, approved)?;
    Ok(())
}

fn new_attendance(request: &CreateAttendanceRequest, marked_by: Uuid) -> NewAttendance<'_> {
    NewAttendance {
        user_id: request.user,
        date: request.date,
        is_present: derive_presence(&request.hours, request.is_present),
        marked_by,
        hours: &request.hours,
    }
}

/// POST /api/v1/attendance
pub async fn create_attendance(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateAttendanceRequest>,
) -> Result<(StatusCode, Json<AttendanceRecord>), ApiError> {
    authorize(&current.caller, Action::RecordAttendance)?;
    request.validate()?;
    check_edit_window(&state.pool, &current.caller, request.date).await?;

    let record = AttendanceRepository::new(state.pool.clone())
        .create(new_attendance(&request, current.id()))
        .await?;
    record_attendance_created(1);

    info!(
        record_id = %record.id,
        user_id = %record.user_id,
        date = %record.date,
        is_present = record.is_present,
        "Attendance recorded"
    );
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// PUT /api/v1/attendance/:id
///
/// Supplying `hours` replaces the stored set. Presence is re-derived from
/// whichever hour set the record ends up with.
pub async fn update_attendance(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAttendanceRequest>,
) -> Result<Json<AttendanceRecord>, ApiError> {
    authorize(&current.caller, Action::RecordAttendance)?;
    request.validate()?;

    let repo = AttendanceRepository::new(state.pool.clone());
    let existing = repo
        .find_by_id(id, &RecordScope::All)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".into()))?;
    check_edit_window(&state.pool, &current.caller, existing.date).await?;

    let hours = request.hours.as_deref().unwrap_or(&existing.hours.0);
    let is_present = derive_presence(
        hours,
        Some(request.is_present.unwrap_or(existing.is_present)),
    );

    let record = repo
        .update(id, is_present, request.hours.as_deref(), current.id())
        .await?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".into()))?;

    info!(
        record_id = %id,
        is_present,
        hours_replaced = request.hours.is_some(),
        "Attendance updated"
    );
    Ok(Json(record.into()))
}

/// DELETE /api/v1/attendance/:id
pub async fn delete_attendance(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&current.caller, Action::RecordAttendance)?;

    let repo = AttendanceRepository::new(state.pool.clone());
    let existing = repo
        .find_by_id(id, &RecordScope::All)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".into()))?;
    check_edit_window(&state.pool, &current.caller, existing.date).await?;

    if repo.delete(id).await? == 0 {
        return Err(ApiError::NotFound("Attendance record not found".into()));
    }

    info!(record_id = %id, deleted_by = %current.id(), "Attendance deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn item_error(field: &str, message: impl Into<String>) -> BulkItemOutcome {
    BulkItemOutcome::Error {
        errors: vec![FieldError {
            field: field.to_string(),
            message: message.into(),
        }],
    }
}

/// Parses and validates one bulk element.
fn parse_item(value: serde_json::Value) -> Result<CreateAttendanceRequest, BulkItemOutcome> {
    let request: CreateAttendanceRequest = serde_json::from_value(value)
        .map_err(|e| item_error("non_field_errors", e.to_string()))?;
    request.validate().map_err(|e| BulkItemOutcome::Error {
        errors: field_errors(&e),
    })?;
    Ok(request)
}

/// Create many records, each on its own.
///
/// POST /api/v1/attendance/bulk_create
///
/// The response has one entry per input element, in order. A failing element
/// does not affect the others.
pub async fn bulk_create(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(items): Json<Vec<serde_json::Value>>,
) -> Result<Json<Vec<BulkItemOutcome>>, ApiError> {
    authorize(&current.caller, Action::RecordAttendance)?;

    let max = state.config.limits.max_bulk_items;
    if items.len() > max {
        return Err(ApiError::Validation(format!(
            "At most {} records can be submitted at once",
            max
        )));
    }

    let repo = AttendanceRepository::new(state.pool.clone());
    let mut outcomes = Vec::with_capacity(items.len());
    let mut created = 0usize;

    for item in items {
        let request = match parse_item(item) {
            Ok(request) => request,
            Err(outcome) => {
                outcomes.push(outcome);
                continue;
            }
        };

        match check_edit_window(&state.pool, &current.caller, request.date).await {
            Ok(()) => {}
            Err(ApiError::StateConflict(message)) => {
                outcomes.push(item_error("date", message));
                continue;
            }
            Err(e) => return Err(e),
        }

        match repo.create(new_attendance(&request, current.id())).await {
            Ok(record) => {
                created += 1;
                outcomes.push(BulkItemOutcome::Created {
                    record: record.into(),
                });
            }
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
                outcomes.push(item_error(
                    "non_field_errors",
                    "Attendance for this user and date already exists",
                ));
            }
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23503") => {
                outcomes.push(item_error("user", "User not found"));
            }
            Err(e) => return Err(e.into()),
        }
    }

    record_attendance_created(created);
    let failed = outcomes.len() - created;
    if failed > 0 {
        warn!(created, failed, "Bulk attendance partially rejected");
    }
    info!(created, failed, marked_by = %current.id(), "Bulk attendance processed");

    Ok(Json(outcomes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_item_valid() {
        let request = parse_item(json!({
            "user": Uuid::new_v4(),
            "date": "2024-03-04",
            "hours": [
                { "hour": 1, "status": "PRESENT" },
                { "hour": 2, "status": "ABSENT" },
                { "hour": 3, "status": "PRESENT" }
            ]
        }))
        .unwrap();
        assert!(new_attendance(&request, Uuid::new_v4()).is_present);
    }

    #[test]
    fn test_parse_item_missing_field() {
        let outcome = parse_item(json!({ "date": "2024-03-04" })).unwrap_err();
        match outcome {
            BulkItemOutcome::Error { errors } => {
                assert_eq!(errors[0].field, "non_field_errors");
                assert!(errors[0].message.contains("user"));
            }
            BulkItemOutcome::Created { .. } => panic!("expected error"),
        }
    }

    #[test]
    fn test_parse_item_invalid_hours() {
        let outcome = parse_item(json!({
            "user": Uuid::new_v4(),
            "date": "2024-03-04",
            "hours": [{ "hour": 9 }]
        }))
        .unwrap_err();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["errors"][0]["field"], "hours");
    }

    #[test]
    fn test_supplied_flag_used_without_hours() {
        let request = parse_item(json!({
            "user": Uuid::new_v4(),
            "date": "2024-03-04",
            "is_present": true
        }))
        .unwrap();
        assert!(new_attendance(&request, Uuid::new_v4()).is_present);

        let request = parse_item(json!({ "user": Uuid::new_v4(), "date": "2024-03-04" })).unwrap();
        assert!(!new_attendance(&request, Uuid::new_v4()).is_present);
    }
}
