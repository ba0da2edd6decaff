//! Academic task entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{TaskPriority, TaskStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Task row joined with author and subject names.
#[derive(Debug, Clone, FromRow)]
pub struct TaskEntity {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub subject_id: Uuid,
    pub subject_name: String,
    pub department: Option<String>,
    pub study_year: Option<String>,
    pub staff_id: Uuid,
    pub staff_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<TaskEntity> for domain::models::AcademicTask {
    fn from(entity: TaskEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            due_date: entity.due_date,
            priority: entity.priority,
            status: entity.status,
            subject_id: entity.subject_id,
            subject_name: entity.subject_name,
            department: entity.department,
            study_year: entity.study_year,
            staff_id: entity.staff_id,
            staff_name: entity.staff_name,
            created_at: entity.created_at,
        }
    }
}
