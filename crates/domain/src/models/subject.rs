//! Subjects taught within a course.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A subject with its teaching materials and assigned staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    #[serde(rename = "course")]
    pub course_id: Uuid,
    pub code: String,
    pub name: String,
    pub credits: i32,
    pub semester: i32,
    pub lessons_count: i32,
    /// Opaque material filenames.
    pub materials: Vec<String>,
    pub lesson_names: Vec<String>,
    pub assigned_staff: Vec<Uuid>,
}

fn validate_materials(materials: &[String]) -> Result<(), ValidationError> {
    shared::validation::validate_material_names(materials)
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSubjectRequest {
    pub course: Uuid,

    #[validate(length(min = 1, max = 20, message = "Code must be 1-20 characters"))]
    pub code: String,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[serde(default = "default_credits")]
    #[validate(range(min = 0, max = 30, message = "Credits must be between 0 and 30"))]
    pub credits: i32,

    #[validate(range(min = 1, max = 12, message = "Semester must be between 1 and 12"))]
    pub semester: i32,

    #[serde(default = "default_lessons")]
    #[validate(range(min = 0, max = 100))]
    pub lessons_count: i32,

    #[serde(default)]
    #[validate(custom(function = "validate_materials"))]
    pub materials: Vec<String>,

    #[serde(default)]
    pub lesson_names: Vec<String>,

    #[serde(default)]
    pub assigned_staff: Vec<Uuid>,
}

fn default_credits() -> i32 {
    3
}

fn default_lessons() -> i32 {
    5
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSubjectRequest {
    pub course: Option<Uuid>,
    #[validate(length(min = 1, max = 20))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(range(min = 0, max = 30))]
    pub credits: Option<i32>,
    #[validate(range(min = 1, max = 12))]
    pub semester: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub lessons_count: Option<i32>,
    #[validate(custom(function = "validate_materials"))]
    pub materials: Option<Vec<String>>,
    pub lesson_names: Option<Vec<String>>,
    pub assigned_staff: Option<Vec<Uuid>>,
}

/// Replaces the material list of a subject.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateMaterialsRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_materials"))]
    pub materials: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListSubjectsQuery {
    pub course: Option<Uuid>,
    pub semester: Option<i32>,
}
