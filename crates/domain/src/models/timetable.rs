//! Weekly teaching timetable per department and study year.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Staff member assigned to one hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourAssignment {
    pub hour: i32,
    #[serde(rename = "staff")]
    pub staff_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timetable {
    pub id: Uuid,
    pub department: String,
    pub study_year: String,
    pub assignments: Vec<HourAssignment>,
    pub last_updated: DateTime<Utc>,
}

fn validate_assignments(assignments: &[HourAssignment]) -> Result<(), ValidationError> {
    shared::validation::validate_hours(assignments.iter().map(|a| a.hour))
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTimetableRequest {
    #[validate(length(min = 1, max = 100, message = "Department must be 1-100 characters"))]
    pub department: String,

    #[validate(length(min = 1, max = 20, message = "Study year must be 1-20 characters"))]
    pub study_year: String,

    #[serde(default)]
    #[validate(custom(function = "validate_assignments"))]
    pub assignments: Vec<HourAssignment>,
}

/// Partial update. Supplying `assignments` replaces the stored set.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTimetableRequest {
    #[validate(length(min = 1, max = 100))]
    pub department: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub study_year: Option<String>,
    #[validate(custom(function = "validate_assignments"))]
    pub assignments: Option<Vec<HourAssignment>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTimetablesQuery {
    pub department: Option<String>,
    pub study_year: Option<String>,
}
