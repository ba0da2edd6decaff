//! In-app notifications. A notification without a recipient is a broadcast.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::ApprovalStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Option<Uuid>,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub read: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateNotificationRequest {
    pub user: Option<Uuid>,

    #[validate(length(min = 1, max = 2000, message = "Message must be 1-2000 characters"))]
    pub message: String,

    #[serde(rename = "type", default = "default_type")]
    #[validate(length(min = 1, max = 50))]
    pub notification_type: String,
}

fn default_type() -> String {
    "SYSTEM".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateNotificationRequest {
    pub read: Option<bool>,
    #[validate(length(min = 1, max = 2000))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearNotificationsResponse {
    pub status: &'static str,
    pub deleted: u64,
}

/// A notification sent to the requester when a workflow request is decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionNotice<'a> {
    Curriculum {
        dept_name: &'a str,
        batch_name: &'a str,
        status: ApprovalStatus,
    },
    /// One approver's sign-off on an attendance edit request.
    AttendanceEdit { approver: &'a str, date: NaiveDate },
    Leave {
        start_date: NaiveDate,
        status: ApprovalStatus,
    },
}

impl DecisionNotice<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            DecisionNotice::Curriculum {
                status: ApprovalStatus::Approved,
                ..
            } => "ACCESS_GRANTED",
            DecisionNotice::Curriculum { .. } => "ACCESS_DENIED",
            DecisionNotice::AttendanceEdit { .. } => "EDIT_APPROVED",
            DecisionNotice::Leave { .. } => "LEAVE",
        }
    }

    pub fn message(&self) -> String {
        match self {
            DecisionNotice::Curriculum {
                dept_name,
                batch_name,
                status,
            } => format!(
                "Your request to edit the {} curriculum for batch {} was {}.",
                dept_name,
                batch_name,
                status.as_str().to_lowercase()
            ),
            DecisionNotice::AttendanceEdit { approver, date } => {
                format!("{} approved attendance edits for {}.", approver, date)
            }
            DecisionNotice::Leave { start_date, status } => format!(
                "Your leave request starting {} was {}.",
                start_date,
                status.as_str().to_lowercase()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curriculum_notice_kind_follows_decision() {
        let approved = DecisionNotice::Curriculum {
            dept_name: "Mechanical",
            batch_name: "2024-2028",
            status: ApprovalStatus::Approved,
        };
        assert_eq!(approved.kind(), "ACCESS_GRANTED");
        assert_eq!(
            approved.message(),
            "Your request to edit the Mechanical curriculum for batch 2024-2028 was approved."
        );

        let rejected = DecisionNotice::Curriculum {
            dept_name: "Mechanical",
            batch_name: "2024-2028",
            status: ApprovalStatus::Rejected,
        };
        assert_eq!(rejected.kind(), "ACCESS_DENIED");
    }

    #[test]
    fn test_attendance_notice() {
        let notice = DecisionNotice::AttendanceEdit {
            approver: "DEAN",
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
        };
        assert_eq!(notice.kind(), "EDIT_APPROVED");
        assert_eq!(notice.message(), "DEAN approved attendance edits for 2024-03-04.");
    }
}
