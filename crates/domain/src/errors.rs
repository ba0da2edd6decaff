//! Domain error types.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{ApprovalStatus, MarkBatchStatus};

/// A state-machine rule was violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Mark batch is {status}; records can only change while it is OPEN")]
    BatchClosed { status: MarkBatchStatus },

    #[error("Mark batch cannot move from {from} back to {to}")]
    InvalidTransition {
        from: MarkBatchStatus,
        to: MarkBatchStatus,
    },

    #[error("Request has already been {status}")]
    AlreadyDecided { status: ApprovalStatus },

    #[error("Curriculum is already editable")]
    AlreadyEditable,

    #[error("Curriculum is frozen; an approved edit request is required")]
    CurriculumFrozen,

    #[error("Attendance for {date} is closed; an approved edit request is required")]
    AttendanceLocked { date: NaiveDate },
}

/// The caller's role does not permit the action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct AccessDenied(pub &'static str);
