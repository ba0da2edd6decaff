//! Student leave requests routed to the student's mentor.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::approval::ApprovalStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "leave_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum LeaveType {
    Medical,
    Personal,
    Academic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: Uuid,
    #[serde(rename = "student")]
    pub student_id: Uuid,
    pub student_name: String,
    #[serde(rename = "mentor")]
    pub mentor_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_date: NaiveDate,
    pub end_time: Option<NaiveTime>,
    pub reason: String,
    pub status: ApprovalStatus,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

fn validate_leave_dates(req: &CreateLeaveRequest) -> Result<(), ValidationError> {
    shared::validation::validate_date_range(req.start_date, req.end_date)
}

/// Submitted by a student; the mentor is taken from the student's profile.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_leave_dates"))]
pub struct CreateLeaveRequest {
    #[serde(rename = "type")]
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_date: NaiveDate,
    pub end_time: Option<NaiveTime>,
    #[validate(length(min = 1, max = 2000, message = "Reason must be 1-2000 characters"))]
    pub reason: String,
}

/// Edits to a still-pending leave. Dates are re-checked against the stored row.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateLeaveRequest {
    #[serde(rename = "type")]
    pub leave_type: Option<LeaveType>,
    pub start_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
    #[validate(length(min = 1, max = 2000))]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leave_dates_checked() {
        let req: CreateLeaveRequest = serde_json::from_value(serde_json::json!({
            "type": "MEDICAL",
            "start_date": "2024-03-10",
            "end_date": "2024-03-08",
            "reason": "Fever"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_single_day_leave_with_times() {
        let req: CreateLeaveRequest = serde_json::from_value(serde_json::json!({
            "type": "PERSONAL",
            "start_date": "2024-03-10",
            "start_time": "09:00:00",
            "end_date": "2024-03-10",
            "end_time": "13:00:00",
            "reason": "Family function"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.leave_type, LeaveType::Personal);
    }
}
