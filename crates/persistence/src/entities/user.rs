//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::UserRole;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: UserRole,
    pub department: Option<String>,
    pub study_year: Option<String>,
    pub reg_no: Option<String>,
    pub staff_id: Option<String>,
    pub designation: Option<String>,
    pub experience: Option<String>,
    pub avatar: Option<String>,
    pub mentor_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for domain::models::User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            username: entity.username,
            email: entity.email,
            name: entity.name,
            role: entity.role,
            department: entity.department,
            study_year: entity.study_year,
            reg_no: entity.reg_no,
            staff_id: entity.staff_id,
            designation: entity.designation,
            experience: entity.experience,
            avatar: entity.avatar,
            mentor_id: entity.mentor_id,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<&UserEntity> for domain::services::Caller {
    fn from(entity: &UserEntity) -> Self {
        Self {
            id: entity.id,
            role: entity.role,
            department: entity.department.clone(),
            study_year: entity.study_year.clone(),
        }
    }
}
