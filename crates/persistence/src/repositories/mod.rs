//! Repository implementations for data access.
//!
//! Repositories provide a clean interface for database operations.

pub mod academic;
pub mod attendance;
pub mod attendance_request;
pub mod batch;
pub mod course;
pub mod curriculum_request;
pub mod leave;
pub mod mark;
pub mod notification;
pub mod portal;
pub mod settings;
pub mod subject;
pub mod task;
pub mod timetable;
pub mod user;

pub use academic::AcademicRecordRepository;
pub use attendance::{AttendanceRepository, NewAttendance};
pub use attendance_request::AttendanceRequestRepository;
pub use batch::BatchRepository;
pub use course::CourseRepository;
pub use curriculum_request::CurriculumRequestRepository;
pub use leave::LeaveRepository;
pub use mark::MarkRepository;
pub use notification::NotificationRepository;
pub use portal::PortalRepository;
pub use settings::SettingsRepository;
pub use subject::SubjectRepository;
pub use task::TaskRepository;
pub use timetable::TimetableRepository;
pub use user::UserRepository;

use domain::services::RecordScope;
use uuid::Uuid;

/// A [`RecordScope`] flattened into nullable bind parameters.
///
/// Queries combine these as `NOT $deny AND ($own::uuid IS NULL OR owner = $own) ...`.
/// Variants a table cannot express are turned into `deny`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ScopeBinds {
    pub deny: bool,
    pub own: Option<Uuid>,
    pub author: Option<Uuid>,
    pub mentor: Option<Uuid>,
    pub cohort: bool,
    pub department: Option<String>,
    pub study_year: Option<String>,
}

impl ScopeBinds {
    pub fn new(scope: &RecordScope, supported: impl Fn(&RecordScope) -> bool) -> Self {
        let denied = Self {
            deny: true,
            ..Default::default()
        };
        if matches!(scope, RecordScope::Nothing) {
            return denied;
        }
        if !matches!(scope, RecordScope::All) && !supported(scope) {
            return denied;
        }

        match scope {
            RecordScope::Own(id) | RecordScope::OwnOrBroadcast(id) => Self {
                own: Some(*id),
                ..Default::default()
            },
            RecordScope::AuthoredBy(id) => Self {
                author: Some(*id),
                ..Default::default()
            },
            RecordScope::MentoredBy(id) => Self {
                mentor: Some(*id),
                ..Default::default()
            },
            RecordScope::Cohort {
                department,
                study_year,
            } => Self {
                cohort: true,
                department: department.clone(),
                study_year: study_year.clone(),
                ..Default::default()
            },
            RecordScope::All | RecordScope::Nothing => Self::default(),
        }
    }
}

/// Builds an `ILIKE` pattern matching `term` anywhere, with wildcards escaped.
pub(crate) fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
