//! Leave request entity (database row mapping).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use domain::models::{ApprovalStatus, LeaveType};
use sqlx::FromRow;
use uuid::Uuid;

/// Leave row joined with the student's display name.
#[derive(Debug, Clone, FromRow)]
pub struct LeaveEntity {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub mentor_id: Option<Uuid>,
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

impl From<LeaveEntity> for domain::models::LeaveRequest {
    fn from(entity: LeaveEntity) -> Self {
        Self {
            id: entity.id,
            student_id: entity.student_id,
            student_name: entity.student_name,
            mentor_id: entity.mentor_id,
            leave_type: entity.leave_type,
            start_date: entity.start_date,
            start_time: entity.start_time,
            end_date: entity.end_date,
            end_time: entity.end_time,
            reason: entity.reason,
            status: entity.status,
            decided_by: entity.decided_by,
            decided_at: entity.decided_at,
            created_at: entity.created_at,
        }
    }
}
