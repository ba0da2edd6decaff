//! Timetable entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::HourAssignment;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Timetable row with its hour assignments aggregated as JSON.
#[derive(Debug, Clone, FromRow)]
pub struct TimetableEntity {
    pub id: Uuid,
    pub department: String,
    pub study_year: String,
    pub last_updated: DateTime<Utc>,
    pub assignments: Json<Vec<HourAssignment>>,
}

impl From<TimetableEntity> for domain::models::Timetable {
    fn from(entity: TimetableEntity) -> Self {
        Self {
            id: entity.id,
            department: entity.department,
            study_year: entity.study_year,
            assignments: entity.assignments.0,
            last_updated: entity.last_updated,
        }
    }
}
