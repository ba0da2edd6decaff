//! Academic tasks published by staff to a cohort.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    #[serde(rename = "TO DO")]
    #[sqlx(rename = "TO DO")]
    Todo,
    #[serde(rename = "IN PROGRESS")]
    #[sqlx(rename = "IN PROGRESS")]
    InProgress,
    #[serde(rename = "COMPLETED")]
    #[sqlx(rename = "COMPLETED")]
    Completed,
}

/// A task with the author and subject names resolved for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicTask {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    #[serde(rename = "subject")]
    pub subject_id: Uuid,
    pub subject_name: String,
    pub department: Option<String>,
    pub study_year: Option<String>,
    #[serde(rename = "staff")]
    pub staff_id: Uuid,
    pub staff_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,

    pub due_date: DateTime<Utc>,

    #[serde(default = "default_priority")]
    pub priority: TaskPriority,

    #[serde(default = "default_status")]
    pub status: TaskStatus,

    pub subject: Uuid,

    #[validate(length(max = 100))]
    pub department: Option<String>,

    #[validate(length(max = 20))]
    pub study_year: Option<String>,
}

fn default_priority() -> TaskPriority {
    TaskPriority::Medium
}

fn default_status() -> TaskStatus {
    TaskStatus::Todo
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub subject: Option<Uuid>,
    #[validate(length(max = 100))]
    pub department: Option<String>,
    #[validate(length(max = 20))]
    pub study_year: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTasksQuery {
    pub subject: Option<Uuid>,
    pub status: Option<TaskStatus>,
}
