//! Guarded state transitions for the registry's approval workflows.

use chrono::NaiveDate;

use crate::errors::WorkflowError;
use crate::models::{
    ApprovalStatus, CurriculumStatus, Decision, HourAttendance, HourStatus, MarkBatchStatus,
    UserRole,
};

/// Fails unless records in a batch with this status may be created or edited.
pub fn ensure_marks_editable(status: MarkBatchStatus) -> Result<(), WorkflowError> {
    match status {
        MarkBatchStatus::Open => Ok(()),
        status => Err(WorkflowError::BatchClosed { status }),
    }
}

/// Moves a mark batch forward. Staying in place is allowed; going back is not.
pub fn transition_mark_batch(
    from: MarkBatchStatus,
    to: MarkBatchStatus,
) -> Result<MarkBatchStatus, WorkflowError> {
    if to.rank() < from.rank() {
        return Err(WorkflowError::InvalidTransition { from, to });
    }
    Ok(to)
}

/// Single-approver decision on a leave or curriculum-edit request.
pub fn decide(
    current: ApprovalStatus,
    decision: Decision,
) -> Result<ApprovalStatus, WorkflowError> {
    if current.is_decided() {
        return Err(WorkflowError::AlreadyDecided { status: current });
    }
    Ok(match decision {
        Decision::Approve => ApprovalStatus::Approved,
        Decision::Reject => ApprovalStatus::Rejected,
    })
}

/// A curriculum edit can only be requested while the curriculum is frozen.
pub fn ensure_curriculum_frozen(status: CurriculumStatus) -> Result<(), WorkflowError> {
    match status {
        CurriculumStatus::Frozen => Ok(()),
        CurriculumStatus::Editable => Err(WorkflowError::AlreadyEditable),
    }
}

/// Subject changes under a frozen curriculum are reserved for administrators.
pub fn ensure_curriculum_editable(
    role: UserRole,
    status: CurriculumStatus,
) -> Result<(), WorkflowError> {
    match (role, status) {
        (UserRole::Admin, _) | (_, CurriculumStatus::Editable) => Ok(()),
        _ => Err(WorkflowError::CurriculumFrozen),
    }
}

/// Attendance dated before `today` only changes under a fully approved edit
/// request held by the caller. Administrators are not gated.
pub fn ensure_attendance_editable(
    role: UserRole,
    date: NaiveDate,
    today: NaiveDate,
    approved_request: bool,
) -> Result<(), WorkflowError> {
    if role == UserRole::Admin || date >= today || approved_request {
        Ok(())
    } else {
        Err(WorkflowError::AttendanceLocked { date })
    }
}

/// The three approval flags on an attendance edit request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceApprovals {
    pub admin: bool,
    pub dean: bool,
    pub hod: bool,
}

/// Which flag an approver's role controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalFlag {
    Admin,
    Dean,
    Hod,
}

impl ApprovalFlag {
    pub fn for_role(role: UserRole) -> Option<Self> {
        match role {
            UserRole::Admin => Some(ApprovalFlag::Admin),
            UserRole::Dean => Some(ApprovalFlag::Dean),
            UserRole::Hod => Some(ApprovalFlag::Hod),
            _ => None,
        }
    }

    /// The approving role, as shown to the requester.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalFlag::Admin => "ADMIN",
            ApprovalFlag::Dean => "DEAN",
            ApprovalFlag::Hod => "HOD",
        }
    }
}

impl AttendanceApprovals {
    /// All three approvers must agree; a single rejection ends the request.
    pub fn record(
        mut self,
        current: ApprovalStatus,
        flag: ApprovalFlag,
        decision: Decision,
    ) -> Result<(AttendanceApprovals, ApprovalStatus), WorkflowError> {
        if current.is_decided() {
            return Err(WorkflowError::AlreadyDecided { status: current });
        }

        if decision == Decision::Reject {
            return Ok((self, ApprovalStatus::Rejected));
        }

        match flag {
            ApprovalFlag::Admin => self.admin = true,
            ApprovalFlag::Dean => self.dean = true,
            ApprovalFlag::Hod => self.hod = true,
        }

        let status = if self.admin && self.dean && self.hod {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Pending
        };
        Ok((self, status))
    }
}

/// A day with this many ABSENT hours counts as absent. OTHER hours are
/// justified and never count against the student.
pub const ABSENT_HOURS_LIMIT: usize = 4;

/// Day-level presence for a record.
///
/// With hour entries, a day counts as present while fewer than
/// [`ABSENT_HOURS_LIMIT`] hours are ABSENT. Without them, the supplied flag is
/// kept (default absent).
pub fn derive_presence(hours: &[HourAttendance], supplied: Option<bool>) -> bool {
    if hours.is_empty() {
        return supplied.unwrap_or(false);
    }
    let absent = hours
        .iter()
        .filter(|h| h.status == HourStatus::Absent)
        .count();
    absent < ABSENT_HOURS_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hour(hour: i32, status: HourStatus) -> HourAttendance {
        HourAttendance {
            hour,
            status,
            detail: String::new(),
        }
    }

    #[test]
    fn test_marks_editable_only_when_open() {
        assert!(ensure_marks_editable(MarkBatchStatus::Open).is_ok());
        assert_eq!(
            ensure_marks_editable(MarkBatchStatus::Frozen),
            Err(WorkflowError::BatchClosed {
                status: MarkBatchStatus::Frozen
            })
        );
        assert!(ensure_marks_editable(MarkBatchStatus::Blocked).is_err());
    }

    #[test]
    fn test_mark_batch_moves_forward_only() {
        use MarkBatchStatus::*;
        assert_eq!(transition_mark_batch(Open, Frozen), Ok(Frozen));
        assert_eq!(transition_mark_batch(Frozen, Blocked), Ok(Blocked));
        assert_eq!(transition_mark_batch(Open, Blocked), Ok(Blocked));
        assert_eq!(transition_mark_batch(Frozen, Frozen), Ok(Frozen));
        assert_eq!(
            transition_mark_batch(Frozen, Open),
            Err(WorkflowError::InvalidTransition {
                from: Frozen,
                to: Open
            })
        );
        assert!(transition_mark_batch(Blocked, Frozen).is_err());
    }

    #[test]
    fn test_decide_is_terminal() {
        let approved = decide(ApprovalStatus::Pending, Decision::Approve).unwrap();
        assert_eq!(approved, ApprovalStatus::Approved);
        assert_eq!(
            decide(approved, Decision::Reject),
            Err(WorkflowError::AlreadyDecided {
                status: ApprovalStatus::Approved
            })
        );
        assert_eq!(
            decide(ApprovalStatus::Pending, Decision::Reject),
            Ok(ApprovalStatus::Rejected)
        );
        assert!(decide(ApprovalStatus::Rejected, Decision::Approve).is_err());
    }

    #[test]
    fn test_curriculum_request_needs_frozen() {
        assert!(ensure_curriculum_frozen(CurriculumStatus::Frozen).is_ok());
        assert_eq!(
            ensure_curriculum_frozen(CurriculumStatus::Editable),
            Err(WorkflowError::AlreadyEditable)
        );
    }

    #[test]
    fn test_attendance_edit_needs_all_three() {
        let start = AttendanceApprovals::default();
        let (flags, status) = start
            .record(ApprovalStatus::Pending, ApprovalFlag::Admin, Decision::Approve)
            .unwrap();
        assert_eq!(status, ApprovalStatus::Pending);

        let (flags, status) = flags
            .record(status, ApprovalFlag::Dean, Decision::Approve)
            .unwrap();
        assert_eq!(status, ApprovalStatus::Pending);

        // Repeating an approval is harmless while pending.
        let (flags, status) = flags
            .record(status, ApprovalFlag::Dean, Decision::Approve)
            .unwrap();
        assert_eq!(status, ApprovalStatus::Pending);

        let (flags, status) = flags
            .record(status, ApprovalFlag::Hod, Decision::Approve)
            .unwrap();
        assert_eq!(status, ApprovalStatus::Approved);
        assert!(flags.admin && flags.dean && flags.hod);

        assert!(flags
            .record(status, ApprovalFlag::Admin, Decision::Reject)
            .is_err());
    }

    #[test]
    fn test_attendance_edit_single_rejection_ends_it() {
        let (flags, status) = AttendanceApprovals::default()
            .record(ApprovalStatus::Pending, ApprovalFlag::Admin, Decision::Approve)
            .unwrap();
        let (_, status) = flags
            .record(status, ApprovalFlag::Hod, Decision::Reject)
            .unwrap();
        assert_eq!(status, ApprovalStatus::Rejected);
    }

    #[test]
    fn test_flag_for_role() {
        assert_eq!(ApprovalFlag::for_role(UserRole::Dean), Some(ApprovalFlag::Dean));
        assert_eq!(ApprovalFlag::for_role(UserRole::Staff), None);
        assert_eq!(ApprovalFlag::for_role(UserRole::Student), None);
        assert_eq!(ApprovalFlag::Hod.as_str(), UserRole::Hod.as_str());
    }

    #[test]
    fn test_presence_counts_absent_hours() {
        use HourStatus::*;
        assert!(!derive_presence(&[], None));
        assert!(derive_presence(&[], Some(true)));
        assert!(derive_presence(
            &[hour(1, Present), hour(2, Absent), hour(3, Absent)],
            Some(false)
        ));

        // Justified hours do not count against the student.
        let mut day: Vec<_> = (1..=3).map(|h| hour(h, Present)).collect();
        day.extend((4..=7).map(|h| hour(h, Other)));
        assert!(derive_presence(&day, Some(false)));

        let three_absent: Vec<_> = (1..=3).map(|h| hour(h, Absent)).collect();
        assert!(derive_presence(&three_absent, Some(false)));
        let four_absent: Vec<_> = (1..=4).map(|h| hour(h, Absent)).collect();
        assert!(!derive_presence(&four_absent, Some(true)));
    }

    #[test]
    fn test_curriculum_gate() {
        use CurriculumStatus::*;
        assert!(ensure_curriculum_editable(UserRole::Admin, Frozen).is_ok());
        assert!(ensure_curriculum_editable(UserRole::Hod, Editable).is_ok());
        assert_eq!(
            ensure_curriculum_editable(UserRole::Hod, Frozen),
            Err(WorkflowError::CurriculumFrozen)
        );
        assert!(ensure_curriculum_editable(UserRole::Dean, Frozen).is_err());
    }

    #[test]
    fn test_attendance_edit_window() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let past = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert!(ensure_attendance_editable(UserRole::Staff, today, today, false).is_ok());
        assert!(ensure_attendance_editable(UserRole::Staff, past, today, true).is_ok());
        assert!(ensure_attendance_editable(UserRole::Admin, past, today, false).is_ok());
        assert_eq!(
            ensure_attendance_editable(UserRole::Hod, past, today, false),
            Err(WorkflowError::AttendanceLocked { date: past })
        );
    }
}
