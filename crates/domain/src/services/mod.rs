//! Domain services for the academic registry.
//!
//! Services contain business logic that operates on domain models and have
//! no knowledge of HTTP or SQL.

pub mod academic;
pub mod access;
pub mod workflow;

pub use academic::{
    AcademicRecordSource, AcademicService, AggregationError, AttendanceTally,
};
pub use access::{authorize, scope, Action, Caller, RecordScope, Resource};
pub use workflow::{
    derive_presence, ensure_attendance_editable, ApprovalFlag, AttendanceApprovals,
};
