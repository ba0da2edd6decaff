//! Mark batches (assessment windows) and the scores entered under them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Lifecycle of a mark batch. Only `OPEN` batches accept score changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "mark_batch_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MarkBatchStatus {
    Open,
    Frozen,
    Blocked,
}

impl MarkBatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkBatchStatus::Open => "OPEN",
            MarkBatchStatus::Frozen => "FROZEN",
            MarkBatchStatus::Blocked => "BLOCKED",
        }
    }

    /// Position in the forward-only lifecycle.
    pub fn rank(&self) -> u8 {
        match self {
            MarkBatchStatus::Open => 0,
            MarkBatchStatus::Frozen => 1,
            MarkBatchStatus::Blocked => 2,
        }
    }
}

impl std::fmt::Display for MarkBatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkBatch {
    pub id: Uuid,
    pub name: String,
    pub academic_year: String,
    pub status: MarkBatchStatus,
    pub subjects: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A mark batch with its records, as returned by retrieve.
#[derive(Debug, Clone, Serialize)]
pub struct MarkBatchDetail {
    #[serde(flatten)]
    pub batch: MarkBatch,
    pub records: Vec<MarkRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkRecord {
    pub id: Uuid,
    #[serde(rename = "batch")]
    pub batch_id: Uuid,
    #[serde(rename = "student")]
    pub student_id: Uuid,
    #[serde(rename = "subject")]
    pub subject_id: Uuid,
    pub marks: f64,
    pub max_marks: f64,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMarkBatchRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 20, message = "Academic year must be 1-20 characters"))]
    pub academic_year: String,

    #[serde(default)]
    pub subjects: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMarkBatchRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub academic_year: Option<String>,
    pub status: Option<MarkBatchStatus>,
    pub subjects: Option<Vec<Uuid>>,
}

fn validate_record_score(req: &CreateMarkRecordRequest) -> Result<(), ValidationError> {
    shared::validation::validate_score(req.marks, req.max_marks)
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_record_score"))]
pub struct CreateMarkRecordRequest {
    pub batch: Uuid,
    pub student: Uuid,
    pub subject: Uuid,
    pub marks: f64,
    #[serde(default = "default_max_marks")]
    pub max_marks: f64,
}

fn default_max_marks() -> f64 {
    100.0
}

/// Score change. The combined score is re-checked against the stored row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMarkRecordRequest {
    pub marks: Option<f64>,
    pub max_marks: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMarkBatchesQuery {
    pub status: Option<MarkBatchStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMarkRecordsQuery {
    pub batch: Option<Uuid>,
    pub student: Option<Uuid>,
    pub subject: Option<Uuid>,
}
