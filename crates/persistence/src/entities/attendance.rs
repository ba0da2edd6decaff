//! Attendance entities (database row mappings).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::{ApprovalStatus, HourAttendance};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Attendance row with its hours aggregated as JSON.
#[derive(Debug, Clone, FromRow)]
pub struct AttendanceEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub is_present: bool,
    pub marked_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub hours: Json<Vec<HourAttendance>>,
}

impl From<AttendanceEntity> for domain::models::AttendanceRecord {
    fn from(entity: AttendanceEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            date: entity.date,
            is_present: entity.is_present,
            marked_by: entity.marked_by,
            hours: entity.hours.0,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the attendance_edit_requests table.
#[derive(Debug, Clone, FromRow)]
pub struct AttendanceEditEntity {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub date: NaiveDate,
    pub reason: String,
    pub admin_approved: bool,
    pub dean_approved: bool,
    pub hod_approved: bool,
    pub status: ApprovalStatus,
    pub timestamp: DateTime<Utc>,
}

impl AttendanceEditEntity {
    pub fn approvals(&self) -> domain::services::AttendanceApprovals {
        domain::services::AttendanceApprovals {
            admin: self.admin_approved,
            dean: self.dean_approved,
            hod: self.hod_approved,
        }
    }
}

impl From<AttendanceEditEntity> for domain::models::AttendanceEditRequest {
    fn from(entity: AttendanceEditEntity) -> Self {
        Self {
            id: entity.id,
            requester_id: entity.requester_id,
            date: entity.date,
            reason: entity.reason,
            admin_approved: entity.admin_approved,
            dean_approved: entity.dean_approved,
            hod_approved: entity.hod_approved,
            status: entity.status,
            timestamp: entity.timestamp,
        }
    }
}
