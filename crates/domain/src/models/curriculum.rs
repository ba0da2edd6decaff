//! Requests by a head of department to reopen a frozen curriculum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::approval::ApprovalStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumEditRequest {
    pub id: Uuid,
    #[serde(rename = "hod")]
    pub hod_id: Uuid,
    #[serde(rename = "batch")]
    pub batch_id: Uuid,
    #[serde(rename = "course")]
    pub course_id: Uuid,
    /// Course name at the time of the request.
    pub dept_name: String,
    pub batch_name: String,
    pub reason: String,
    pub status: ApprovalStatus,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCurriculumEditRequest {
    pub batch: Uuid,
    pub course: Uuid,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCurriculumEditRequest {
    #[validate(length(max = 2000))]
    pub reason: String,
}
