//! Role-based read scoping and write authorization.
//!
//! Both are pure functions of the caller so they can be tested without a
//! store. Repositories translate a [`RecordScope`] into a SQL predicate.

use uuid::Uuid;

use crate::errors::AccessDenied;
use crate::models::UserRole;

/// The authenticated user as loaded from the store for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub role: UserRole,
    pub department: Option<String>,
    pub study_year: Option<String>,
}

/// Resources whose reads depend on the caller's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Users,
    Attendance,
    Leaves,
    Tasks,
    MarkRecords,
    AttendanceRequests,
    Notifications,
}

/// Which rows of a resource a caller may read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordScope {
    All,
    /// Rows owned by (or describing) the user.
    Own(Uuid),
    /// Rows addressed to a department and study year.
    Cohort {
        department: Option<String>,
        study_year: Option<String>,
    },
    AuthoredBy(Uuid),
    /// Rows whose student is mentored by the user.
    MentoredBy(Uuid),
    /// Rows addressed to the user plus rows addressed to nobody.
    OwnOrBroadcast(Uuid),
    Nothing,
}

/// Computes the read scope of `caller` over `resource`.
pub fn scope(caller: &Caller, resource: Resource) -> RecordScope {
    if resource == Resource::Notifications {
        return RecordScope::OwnOrBroadcast(caller.id);
    }

    match caller.role {
        UserRole::Admin | UserRole::Dean | UserRole::Hod => RecordScope::All,
        UserRole::Student => match resource {
            Resource::Users
            | Resource::Attendance
            | Resource::Leaves
            | Resource::MarkRecords => RecordScope::Own(caller.id),
            Resource::Tasks => RecordScope::Cohort {
                department: caller.department.clone(),
                study_year: caller.study_year.clone(),
            },
            Resource::AttendanceRequests | Resource::Notifications => RecordScope::Nothing,
        },
        UserRole::Staff | UserRole::AssocProfI | UserRole::AssocProfII | UserRole::AssocProfIII => {
            match resource {
                Resource::Tasks => RecordScope::AuthoredBy(caller.id),
                Resource::Leaves => RecordScope::MentoredBy(caller.id),
                Resource::AttendanceRequests => RecordScope::Own(caller.id),
                _ => RecordScope::All,
            }
        }
    }
}

/// A state-changing operation that needs a role or ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateUser,
    DeleteUsers,
    UpdateUser { target: Uuid, privileged: bool },
    AssignMentors,
    /// Courses, subjects and batches.
    ManageCatalog,
    UpdateMaterials,
    ToggleCurriculum,
    CreateTask,
    ModifyTask { author: Uuid },
    RecordAttendance,
    RequestAttendanceEdit,
    WithdrawAttendanceEdit { requester: Uuid },
    DecideAttendanceEdit,
    ManageMarkBatches,
    EnterMarks,
    SubmitLeave,
    WithdrawLeave { owner: Uuid },
    DecideLeave { mentor: Option<Uuid> },
    ManageTimetables,
    /// Portals are admin-only for reads as well as writes.
    AccessPortals,
    PublishNotification,
    UpdateNotification { recipient: Option<Uuid> },
    DeleteNotification { recipient: Option<Uuid> },
    RequestCurriculumEdit,
    WithdrawCurriculumEdit { requester: Uuid },
    DecideCurriculumEdit,
    ManageSettings,
}

/// Checks whether `caller` may perform `action`.
pub fn authorize(caller: &Caller, action: Action) -> Result<(), AccessDenied> {
    let role = caller.role;
    let is_admin = role == UserRole::Admin;
    let leadership = role.is_leadership();

    let (allowed, reason) = match action {
        Action::CreateUser | Action::DeleteUsers => (
            is_admin,
            "Only administrators can manage accounts",
        ),
        Action::UpdateUser { target, privileged } => (
            is_admin || (target == caller.id && !privileged),
            "Users may only edit their own profile details",
        ),
        Action::AssignMentors => (
            leadership,
            "Only administrators, deans and HODs can assign mentors",
        ),
        Action::ManageCatalog => (
            leadership,
            "Only administrators, deans and HODs can change the catalog",
        ),
        Action::UpdateMaterials => (
            leadership || role.is_faculty(),
            "Only faculty can update subject materials",
        ),
        Action::ToggleCurriculum => (
            matches!(role, UserRole::Admin | UserRole::Hod),
            "Only administrators and HODs can change curriculum status",
        ),
        Action::CreateTask => (role.is_faculty(), "Only faculty can create tasks"),
        Action::ModifyTask { author } => (
            is_admin || author == caller.id,
            "Only the author can change this task",
        ),
        Action::RecordAttendance | Action::EnterMarks => (
            is_admin || role.is_faculty(),
            "Only faculty can record attendance and marks",
        ),
        Action::RequestAttendanceEdit => (
            role.is_faculty(),
            "Only faculty can request attendance edits",
        ),
        Action::WithdrawAttendanceEdit { requester } => (
            is_admin || requester == caller.id,
            "Only the requester can withdraw this request",
        ),
        Action::DecideAttendanceEdit => (
            leadership,
            "Only administrators, deans and HODs can decide attendance edits",
        ),
        Action::ManageMarkBatches => (
            leadership,
            "Only administrators, deans and HODs can manage mark batches",
        ),
        Action::SubmitLeave => (
            role == UserRole::Student,
            "Only students can submit leave requests",
        ),
        Action::WithdrawLeave { owner } => (
            owner == caller.id,
            "Only the student can change this leave request",
        ),
        Action::DecideLeave { mentor } => (
            leadership || mentor == Some(caller.id),
            "Only the mentor or leadership can decide this leave request",
        ),
        Action::ManageTimetables => (
            matches!(role, UserRole::Admin | UserRole::Hod),
            "Only administrators and HODs can manage timetables",
        ),
        Action::AccessPortals | Action::ManageSettings => (
            is_admin,
            "Administrator access required",
        ),
        Action::PublishNotification => (
            leadership,
            "Only administrators, deans and HODs can publish notifications",
        ),
        Action::UpdateNotification { recipient } => (
            recipient == Some(caller.id) || (recipient.is_none() && leadership),
            "Only the recipient can update this notification",
        ),
        Action::DeleteNotification { recipient } => (
            is_admin || recipient == Some(caller.id),
            "Only the recipient can delete this notification",
        ),
        Action::RequestCurriculumEdit => (
            role == UserRole::Hod,
            "Only HODs can request curriculum edits",
        ),
        Action::WithdrawCurriculumEdit { requester } => (
            is_admin || requester == caller.id,
            "Only the requesting HOD can withdraw this request",
        ),
        Action::DecideCurriculumEdit => (
            matches!(role, UserRole::Admin | UserRole::Dean),
            "Only administrators and deans can decide curriculum edits",
        ),
    };

    if allowed {
        Ok(())
    } else {
        Err(AccessDenied(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: UserRole) -> Caller {
        Caller {
            id: Uuid::new_v4(),
            role,
            department: Some("CSE".into()),
            study_year: Some("II".into()),
        }
    }

    #[test]
    fn test_student_scopes() {
        let student = caller(UserRole::Student);
        assert_eq!(scope(&student, Resource::Users), RecordScope::Own(student.id));
        assert_eq!(scope(&student, Resource::Leaves), RecordScope::Own(student.id));
        assert_eq!(
            scope(&student, Resource::MarkRecords),
            RecordScope::Own(student.id)
        );
        assert_eq!(
            scope(&student, Resource::Tasks),
            RecordScope::Cohort {
                department: Some("CSE".into()),
                study_year: Some("II".into())
            }
        );
        assert_eq!(
            scope(&student, Resource::AttendanceRequests),
            RecordScope::Nothing
        );
    }

    #[test]
    fn test_staff_scopes() {
        for role in [UserRole::Staff, UserRole::AssocProfIII] {
            let staff = caller(role);
            assert_eq!(scope(&staff, Resource::Tasks), RecordScope::AuthoredBy(staff.id));
            assert_eq!(scope(&staff, Resource::Leaves), RecordScope::MentoredBy(staff.id));
            assert_eq!(
                scope(&staff, Resource::AttendanceRequests),
                RecordScope::Own(staff.id)
            );
            assert_eq!(scope(&staff, Resource::Attendance), RecordScope::All);
            assert_eq!(scope(&staff, Resource::Users), RecordScope::All);
        }
    }

    #[test]
    fn test_leadership_unrestricted_except_notifications() {
        for role in [UserRole::Admin, UserRole::Dean, UserRole::Hod] {
            let leader = caller(role);
            assert_eq!(scope(&leader, Resource::Leaves), RecordScope::All);
            assert_eq!(scope(&leader, Resource::Tasks), RecordScope::All);
            assert_eq!(
                scope(&leader, Resource::Notifications),
                RecordScope::OwnOrBroadcast(leader.id)
            );
        }
    }

    #[test]
    fn test_user_updates() {
        let student = caller(UserRole::Student);
        assert!(authorize(
            &student,
            Action::UpdateUser {
                target: student.id,
                privileged: false
            }
        )
        .is_ok());
        assert!(authorize(
            &student,
            Action::UpdateUser {
                target: student.id,
                privileged: true
            }
        )
        .is_err());
        assert!(authorize(
            &student,
            Action::UpdateUser {
                target: Uuid::new_v4(),
                privileged: false
            }
        )
        .is_err());
        assert!(authorize(
            &caller(UserRole::Admin),
            Action::UpdateUser {
                target: Uuid::new_v4(),
                privileged: true
            }
        )
        .is_ok());
    }

    #[test]
    fn test_role_gates() {
        let student = caller(UserRole::Student);
        let staff = caller(UserRole::Staff);
        let hod = caller(UserRole::Hod);
        let dean = caller(UserRole::Dean);
        let admin = caller(UserRole::Admin);

        assert!(authorize(&student, Action::CreateTask).is_err());
        assert!(authorize(&staff, Action::CreateTask).is_ok());
        assert!(authorize(&student, Action::EnterMarks).is_err());
        assert!(authorize(&admin, Action::EnterMarks).is_ok());
        assert!(authorize(&staff, Action::SubmitLeave).is_err());
        assert!(authorize(&student, Action::SubmitLeave).is_ok());
        assert!(authorize(&hod, Action::AccessPortals).is_err());
        assert!(authorize(&admin, Action::AccessPortals).is_ok());
        assert!(authorize(&dean, Action::ToggleCurriculum).is_err());
        assert!(authorize(&hod, Action::ToggleCurriculum).is_ok());
        assert!(authorize(&hod, Action::RequestCurriculumEdit).is_ok());
        assert!(authorize(&hod, Action::DecideCurriculumEdit).is_err());
        assert!(authorize(&dean, Action::DecideCurriculumEdit).is_ok());
        assert!(authorize(&staff, Action::DecideAttendanceEdit).is_err());
        assert!(authorize(&staff, Action::UpdateMaterials).is_ok());
        assert!(authorize(&student, Action::UpdateMaterials).is_err());
    }

    #[test]
    fn test_ownership_gates() {
        let staff = caller(UserRole::Staff);
        let other = caller(UserRole::Staff);
        assert!(authorize(&staff, Action::ModifyTask { author: staff.id }).is_ok());
        assert!(authorize(&other, Action::ModifyTask { author: staff.id }).is_err());
        let admin = caller(UserRole::Admin);
        assert!(authorize(&admin, Action::ModifyTask { author: staff.id }).is_ok());

        assert!(authorize(&staff, Action::DecideLeave { mentor: Some(staff.id) }).is_ok());
        assert!(authorize(&other, Action::DecideLeave { mentor: Some(staff.id) }).is_err());
        assert!(authorize(&other, Action::DecideLeave { mentor: None }).is_err());
        assert!(authorize(&caller(UserRole::Hod), Action::DecideLeave { mentor: None }).is_ok());
    }

    #[test]
    fn test_notification_gates() {
        let student = caller(UserRole::Student);
        assert!(authorize(
            &student,
            Action::UpdateNotification {
                recipient: Some(student.id)
            }
        )
        .is_ok());
        assert!(authorize(&student, Action::UpdateNotification { recipient: None }).is_err());
        assert!(authorize(
            &caller(UserRole::Dean),
            Action::UpdateNotification { recipient: None }
        )
        .is_ok());
        assert!(authorize(&student, Action::PublishNotification).is_err());
    }
}
