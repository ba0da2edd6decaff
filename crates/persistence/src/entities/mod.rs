//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod attendance;
pub mod catalog;
pub mod leave;
pub mod mark;
pub mod misc;
pub mod task;
pub mod timetable;
pub mod user;

pub use attendance::{AttendanceEditEntity, AttendanceEntity};
pub use catalog::{BatchEntity, CourseEntity, CurriculumEntity, SubjectEntity};
pub use leave::LeaveEntity;
pub use mark::{MarkBatchEntity, MarkRecordEntity};
pub use misc::{CurriculumRequestEntity, NotificationEntity, PortalEntity, SettingsEntity};
pub use task::TaskEntity;
pub use timetable::TimetableEntity;
pub use user::UserEntity;
