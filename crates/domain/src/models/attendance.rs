//! Daily attendance with per-hour detail, and attendance edit requests.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::approval::ApprovalStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "hour_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum HourStatus {
    Present,
    Absent,
    Other,
}

/// Status of a single teaching period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourAttendance {
    pub hour: i32,
    #[serde(default = "default_hour_status")]
    pub status: HourStatus,
    #[serde(default)]
    pub detail: String,
}

fn default_hour_status() -> HourStatus {
    HourStatus::Present
}

/// One student's attendance for one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub is_present: bool,
    pub marked_by: Option<Uuid>,
    pub hours: Vec<HourAttendance>,
    pub created_at: DateTime<Utc>,
}

const MAX_DETAIL_LEN: usize = 255;

fn validate_hour_set(hours: &[HourAttendance]) -> Result<(), ValidationError> {
    shared::validation::validate_hours(hours.iter().map(|h| h.hour))?;
    if hours.iter().any(|h| h.detail.len() > MAX_DETAIL_LEN) {
        let mut err = ValidationError::new("detail_length");
        err.message = Some("Hour detail must be at most 255 characters".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAttendanceRequest {
    pub user: Uuid,
    pub date: NaiveDate,
    /// Used only when no hours are supplied.
    pub is_present: Option<bool>,
    #[serde(default)]
    #[validate(custom(function = "validate_hour_set"))]
    pub hours: Vec<HourAttendance>,
}

/// Partial update. Supplying `hours` replaces the stored set.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAttendanceRequest {
    pub is_present: Option<bool>,
    #[validate(custom(function = "validate_hour_set"))]
    pub hours: Option<Vec<HourAttendance>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAttendanceQuery {
    pub user: Option<Uuid>,
    pub date: Option<NaiveDate>,
}

/// A validation problem on one field of a bulk item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Per-item result of a bulk attendance submission.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BulkItemOutcome {
    Created { record: AttendanceRecord },
    Error { errors: Vec<FieldError> },
}

/// A faculty request to correct a past attendance entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceEditRequest {
    pub id: Uuid,
    #[serde(rename = "requester")]
    pub requester_id: Uuid,
    pub date: NaiveDate,
    pub reason: String,
    pub admin_approved: bool,
    pub dean_approved: bool,
    pub hod_approved: bool,
    pub status: ApprovalStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAttendanceEditRequest {
    pub date: NaiveDate,
    #[validate(length(min = 1, max = 2000, message = "Reason must be 1-2000 characters"))]
    pub reason: String,
}

/// Edit of a pending attendance edit request.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAttendanceEditRequest {
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 2000, message = "Reason must be 1-2000 characters"))]
    pub reason: Option<String>,
}
