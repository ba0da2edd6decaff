//! Degree programmes and their subjects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::subject::Subject;

/// Undergraduate or postgraduate track. Stored as the `batch_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "batch_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum BatchType {
    Ug,
    Pg,
}

/// A degree programme, e.g. "Computer Science".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub degree: String,
    pub domain: String,
    pub batch_type: BatchType,
}

/// A course together with its subjects, as returned by list and retrieve.
#[derive(Debug, Clone, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "Degree must be 1-100 characters"))]
    pub degree: String,

    #[validate(length(min = 1, max = 100, message = "Domain must be 1-100 characters"))]
    pub domain: String,

    #[serde(default = "default_batch_type")]
    pub batch_type: BatchType,
}

fn default_batch_type() -> BatchType {
    BatchType::Ug
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub degree: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub domain: Option<String>,
    pub batch_type: Option<BatchType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_type_wire_format() {
        assert_eq!(serde_json::to_string(&BatchType::Pg).unwrap(), "\"PG\"");
        let req: CreateCourseRequest = serde_json::from_value(serde_json::json!({
            "name": "Computer Science",
            "degree": "B.E.",
            "domain": "Engineering"
        }))
        .unwrap();
        assert_eq!(req.batch_type, BatchType::Ug);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_course_detail_flattens() {
        let detail = CourseDetail {
            course: Course {
                id: Uuid::nil(),
                name: "CS".into(),
                degree: "B.E.".into(),
                domain: "Engineering".into(),
                batch_type: BatchType::Ug,
            },
            subjects: vec![],
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["name"], "CS");
        assert!(json["subjects"].as_array().unwrap().is_empty());
    }
}
