//! Domain models for the academic registry.

pub mod approval;
pub mod attendance;
pub mod batch;
pub mod course;
pub mod curriculum;
pub mod leave;
pub mod mark;
pub mod notification;
pub mod portal;
pub mod settings;
pub mod subject;
pub mod task;
pub mod timetable;
pub mod user;

pub use approval::{ApprovalStatus, Decision};
pub use attendance::{AttendanceEditRequest, AttendanceRecord, HourAttendance, HourStatus};
pub use batch::{AcademicBatch, BatchCourseCurriculum, CurriculumStatus};
pub use course::{BatchType, Course, CourseDetail};
pub use curriculum::CurriculumEditRequest;
pub use leave::{LeaveRequest, LeaveType};
pub use mark::{MarkBatch, MarkBatchStatus, MarkRecord};
pub use notification::{DecisionNotice, Notification};
pub use portal::{PortalConnection, PortalPermission, PortalStatus};
pub use settings::SiteSettings;
pub use subject::Subject;
pub use task::{AcademicTask, TaskPriority, TaskStatus};
pub use timetable::{HourAssignment, Timetable};
pub use user::{AcademicData, User, UserRole};
