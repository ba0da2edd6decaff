//! Course, subject and batch entities (database row mappings).

use domain::models::{BatchType, CurriculumStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the courses table.
#[derive(Debug, Clone, FromRow)]
pub struct CourseEntity {
    pub id: Uuid,
    pub name: String,
    pub degree: String,
    pub domain: String,
    pub batch_type: BatchType,
}

impl From<CourseEntity> for domain::models::Course {
    fn from(entity: CourseEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            degree: entity.degree,
            domain: entity.domain,
            batch_type: entity.batch_type,
        }
    }
}

/// Subject row with its staff assignments folded into an array.
#[derive(Debug, Clone, FromRow)]
pub struct SubjectEntity {
    pub id: Uuid,
    pub course_id: Uuid,
    pub code: String,
    pub name: String,
    pub credits: i32,
    pub semester: i32,
    pub lessons_count: i32,
    pub materials: Vec<String>,
    pub lesson_names: Vec<String>,
    pub assigned_staff: Vec<Uuid>,
}

impl From<SubjectEntity> for domain::models::Subject {
    fn from(entity: SubjectEntity) -> Self {
        Self {
            id: entity.id,
            course_id: entity.course_id,
            code: entity.code,
            name: entity.name,
            credits: entity.credits,
            semester: entity.semester,
            lessons_count: entity.lessons_count,
            materials: entity.materials,
            lesson_names: entity.lesson_names,
            assigned_staff: entity.assigned_staff,
        }
    }
}

/// Batch row with its linked course ids.
#[derive(Debug, Clone, FromRow)]
pub struct BatchEntity {
    pub id: Uuid,
    pub name: String,
    pub start_year: i32,
    pub end_year: i32,
    pub batch_type: BatchType,
    pub courses: Vec<Uuid>,
}

impl From<BatchEntity> for domain::models::AcademicBatch {
    fn from(entity: BatchEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            start_year: entity.start_year,
            end_year: entity.end_year,
            batch_type: entity.batch_type,
            courses: entity.courses,
        }
    }
}

/// Database row mapping for the batch_course_curricula table.
#[derive(Debug, Clone, FromRow)]
pub struct CurriculumEntity {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub course_id: Uuid,
    pub status: CurriculumStatus,
}

impl From<CurriculumEntity> for domain::models::BatchCourseCurriculum {
    fn from(entity: CurriculumEntity) -> Self {
        Self {
            id: entity.id,
            batch_id: entity.batch_id,
            course_id: entity.course_id,
            status: entity.status,
        }
    }
}
