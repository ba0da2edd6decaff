//! Registry user accounts and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Role carried by every account. Stored as the `user_role` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role")]
pub enum UserRole {
    #[serde(rename = "ADMIN")]
    #[sqlx(rename = "ADMIN")]
    Admin,
    #[serde(rename = "STAFF")]
    #[sqlx(rename = "STAFF")]
    Staff,
    #[serde(rename = "STUDENT")]
    #[sqlx(rename = "STUDENT")]
    Student,
    #[serde(rename = "HOD")]
    #[sqlx(rename = "HOD")]
    Hod,
    #[serde(rename = "DEAN")]
    #[sqlx(rename = "DEAN")]
    Dean,
    #[serde(rename = "ASSOC_PROF_I")]
    #[sqlx(rename = "ASSOC_PROF_I")]
    AssocProfI,
    #[serde(rename = "ASSOC_PROF_II")]
    #[sqlx(rename = "ASSOC_PROF_II")]
    AssocProfII,
    #[serde(rename = "ASSOC_PROF_III")]
    #[sqlx(rename = "ASSOC_PROF_III")]
    AssocProfIII,
}

impl UserRole {
    pub const ALL: [UserRole; 8] = [
        UserRole::Admin,
        UserRole::Staff,
        UserRole::Student,
        UserRole::Hod,
        UserRole::Dean,
        UserRole::AssocProfI,
        UserRole::AssocProfII,
        UserRole::AssocProfIII,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Staff => "STAFF",
            UserRole::Student => "STUDENT",
            UserRole::Hod => "HOD",
            UserRole::Dean => "DEAN",
            UserRole::AssocProfI => "ASSOC_PROF_I",
            UserRole::AssocProfII => "ASSOC_PROF_II",
            UserRole::AssocProfIII => "ASSOC_PROF_III",
        }
    }

    /// Admin, dean and head of department.
    pub fn is_leadership(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Dean | UserRole::Hod)
    }

    /// Any teaching role, leadership included.
    pub fn is_faculty(&self) -> bool {
        !matches!(self, UserRole::Student | UserRole::Admin)
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid role: {}", s))
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registry account. The password hash never leaves the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub department: Option<String>,
    pub study_year: Option<String>,
    pub reg_no: Option<String>,
    pub staff_id: Option<String>,
    pub designation: Option<String>,
    pub experience: Option<String>,
    pub avatar: Option<String>,
    #[serde(rename = "mentor")]
    pub mentor_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating an account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(max = 150, message = "Username must be at most 150 characters"))]
    #[validate(custom(function = "shared::validation::validate_username"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    #[serde(default)]
    #[validate(length(max = 150, message = "Name must be at most 150 characters"))]
    pub name: String,

    #[serde(default = "default_role")]
    pub role: UserRole,

    #[validate(length(max = 100))]
    pub department: Option<String>,

    #[validate(length(max = 20))]
    pub study_year: Option<String>,

    #[validate(length(max = 50))]
    pub reg_no: Option<String>,

    #[validate(length(max = 50))]
    pub staff_id: Option<String>,

    #[validate(length(max = 100))]
    pub designation: Option<String>,

    #[validate(length(max = 10))]
    pub experience: Option<String>,

    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar: Option<String>,

    pub mentor: Option<Uuid>,
}

fn default_role() -> UserRole {
    UserRole::Student
}

/// Partial update for an account. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: Option<String>,

    #[validate(length(max = 150))]
    pub name: Option<String>,

    pub role: Option<UserRole>,

    #[validate(length(max = 100))]
    pub department: Option<String>,

    #[validate(length(max = 20))]
    pub study_year: Option<String>,

    #[validate(length(max = 50))]
    pub reg_no: Option<String>,

    #[validate(length(max = 50))]
    pub staff_id: Option<String>,

    #[validate(length(max = 100))]
    pub designation: Option<String>,

    #[validate(length(max = 10))]
    pub experience: Option<String>,

    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar: Option<String>,

    pub mentor: Option<Uuid>,

    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    /// Fields only an administrator may change on any account. Department and
    /// study year decide which cohort's tasks a student sees.
    pub fn touches_privileged_fields(&self) -> bool {
        self.role.is_some()
            || self.is_active.is_some()
            || self.mentor.is_some()
            || self.department.is_some()
            || self.study_year.is_some()
            || self.reg_no.is_some()
            || self.staff_id.is_some()
    }
}

/// Query filters for listing users.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<UserRole>,
    pub department: Option<String>,
    pub study_year: Option<String>,
    pub mentor: Option<Uuid>,
    /// Case-insensitive match on username, name, email or registration number.
    pub search: Option<String>,
}

/// Assigns a set of students to a staff mentor.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignStudentsRequest {
    #[serde(rename = "staff1Id")]
    pub staff_id: Uuid,
    #[serde(rename = "studentIds", default)]
    pub student_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignStudentsResponse {
    pub status: &'static str,
    pub assigned: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkDeleteResponse {
    pub status: &'static str,
    pub deleted: u64,
}

/// Aggregated academic standing of a student.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcademicData {
    /// Attendance percentage, two decimals.
    pub attendance: f64,
    pub cgpa: f64,
    pub sgpa: f64,
    pub credits: i64,
    #[serde(rename = "greenPoints")]
    pub green_points: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        for role in UserRole::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!("PRINCIPAL".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_groups() {
        assert!(UserRole::Hod.is_leadership());
        assert!(UserRole::Hod.is_faculty());
        assert!(UserRole::AssocProfII.is_faculty());
        assert!(!UserRole::Student.is_faculty());
        assert!(!UserRole::Admin.is_faculty());
        assert!(UserRole::Admin.is_leadership());
    }

    #[test]
    fn test_create_user_defaults_to_student() {
        let req: CreateUserRequest = serde_json::from_value(serde_json::json!({
            "username": "jai.akash",
            "email": "jai@example.edu",
            "password": "long-enough"
        }))
        .unwrap();
        assert_eq!(req.role, UserRole::Student);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_user_validation() {
        let req: CreateUserRequest = serde_json::from_value(serde_json::json!({
            "username": "bad name",
            "email": "not-an-email",
            "password": "short",
            "experience": "far too many years"
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("experience"));
    }

    #[test]
    fn test_assign_request_wire_names() {
        let staff = Uuid::new_v4();
        let student = Uuid::new_v4();
        let req: AssignStudentsRequest = serde_json::from_value(serde_json::json!({
            "staff1Id": staff,
            "studentIds": [student]
        }))
        .unwrap();
        assert_eq!(req.staff_id, staff);
        assert_eq!(req.student_ids, vec![student]);
    }

    #[test]
    fn test_academic_data_serialization() {
        let data = AcademicData {
            attendance: 60.0,
            cgpa: 8.5,
            sgpa: 8.5,
            credits: 6,
            green_points: 145.0,
        };
        let json = serde_json::to_value(data).unwrap();
        assert_eq!(json["greenPoints"], 145.0);
        assert_eq!(json["credits"], 6);
    }

    #[test]
    fn test_privileged_fields() {
        let req = UpdateUserRequest {
            name: Some("x".into()),
            ..Default::default()
        };
        assert!(!req.touches_privileged_fields());
        let req = UpdateUserRequest {
            role: Some(UserRole::Admin),
            ..Default::default()
        };
        assert!(req.touches_privileged_fields());
        let req = UpdateUserRequest {
            study_year: Some("IV".into()),
            ..Default::default()
        };
        assert!(req.touches_privileged_fields());
        let req = UpdateUserRequest {
            reg_no: Some("21CS042".into()),
            ..Default::default()
        };
        assert!(req.touches_privileged_fields());
    }
}
