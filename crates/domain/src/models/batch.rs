//! Academic batches (cohorts) and per-course curriculum status.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::course::BatchType;

/// Whether a batch/course curriculum may currently be edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "curriculum_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum CurriculumStatus {
    Editable,
    Frozen,
}

/// A cohort spanning a range of years, linked to the courses it takes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicBatch {
    pub id: Uuid,
    pub name: String,
    pub start_year: i32,
    pub end_year: i32,
    pub batch_type: BatchType,
    pub courses: Vec<Uuid>,
}

/// Curriculum status of one course inside one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCourseCurriculum {
    pub id: Uuid,
    #[serde(rename = "batch")]
    pub batch_id: Uuid,
    #[serde(rename = "course")]
    pub course_id: Uuid,
    pub status: CurriculumStatus,
}

fn validate_batch_years(req: &CreateBatchRequest) -> Result<(), ValidationError> {
    shared::validation::validate_year_span(req.start_year, req.end_year)
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_batch_years"))]
pub struct CreateBatchRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(range(min = 1900, max = 2200))]
    pub start_year: i32,

    #[validate(range(min = 1900, max = 2200))]
    pub end_year: i32,

    #[serde(default = "default_batch_type")]
    pub batch_type: BatchType,

    #[serde(default, alias = "departments")]
    pub courses: Vec<Uuid>,
}

fn default_batch_type() -> BatchType {
    BatchType::Ug
}

/// Partial update. The year span is re-checked against the stored row by the caller.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBatchRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(range(min = 1900, max = 2200))]
    pub start_year: Option<i32>,
    #[validate(range(min = 1900, max = 2200))]
    pub end_year: Option<i32>,
    pub batch_type: Option<BatchType>,
    #[serde(alias = "departments")]
    pub courses: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCurriculumRequest {
    pub batch: Uuid,
    pub course: Uuid,
    #[serde(default = "default_curriculum_status")]
    pub status: CurriculumStatus,
}

fn default_curriculum_status() -> CurriculumStatus {
    CurriculumStatus::Frozen
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCurriculumRequest {
    pub status: CurriculumStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListCurriculumQuery {
    pub batch: Option<Uuid>,
    pub course: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_span_checked() {
        let req: CreateBatchRequest = serde_json::from_value(serde_json::json!({
            "name": "2024-2028",
            "start_year": 2028,
            "end_year": 2024
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_departments_alias() {
        let course = Uuid::new_v4();
        let req: CreateBatchRequest = serde_json::from_value(serde_json::json!({
            "name": "2024-2028",
            "start_year": 2024,
            "end_year": 2028,
            "departments": [course]
        }))
        .unwrap();
        assert_eq!(req.courses, vec![course]);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_curriculum_defaults_frozen() {
        let req: CreateCurriculumRequest = serde_json::from_value(serde_json::json!({
            "batch": Uuid::new_v4(),
            "course": Uuid::new_v4()
        }))
        .unwrap();
        assert_eq!(req.status, CurriculumStatus::Frozen);
        assert_eq!(
            serde_json::to_string(&CurriculumStatus::Editable).unwrap(),
            "\"EDITABLE\""
        );
    }
}
