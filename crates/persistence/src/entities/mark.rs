//! Mark batch and mark record entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::MarkBatchStatus;
use sqlx::FromRow;
use uuid::Uuid;

/// Mark batch row with its subject ids.
#[derive(Debug, Clone, FromRow)]
pub struct MarkBatchEntity {
    pub id: Uuid,
    pub name: String,
    pub academic_year: String,
    pub status: MarkBatchStatus,
    pub subjects: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<MarkBatchEntity> for domain::models::MarkBatch {
    fn from(entity: MarkBatchEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            academic_year: entity.academic_year,
            status: entity.status,
            subjects: entity.subjects,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the mark_records table.
#[derive(Debug, Clone, FromRow)]
pub struct MarkRecordEntity {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub marks: f64,
    pub max_marks: f64,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl From<MarkRecordEntity> for domain::models::MarkRecord {
    fn from(entity: MarkRecordEntity) -> Self {
        Self {
            id: entity.id,
            batch_id: entity.batch_id,
            student_id: entity.student_id,
            subject_id: entity.subject_id,
            marks: entity.marks,
            max_marks: entity.max_marks,
            updated_by: entity.updated_by,
            updated_at: entity.updated_at,
        }
    }
}
