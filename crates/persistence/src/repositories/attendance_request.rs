//! Attendance edit request repository.

use chrono::NaiveDate;
use domain::errors::WorkflowError;
use domain::models::{ApprovalStatus, Decision, DecisionNotice};
use domain::services::{ApprovalFlag, RecordScope};
use sqlx::PgPool;
use uuid::Uuid;

use super::ScopeBinds;
use crate::entities::AttendanceEditEntity;
use crate::error::RepositoryError;
use crate::metrics::QueryTimer;
use crate::repositories::NotificationRepository;

/// Repository for attendance edit requests and their three-way approval.
#[derive(Clone)]
pub struct AttendanceRequestRepository {
    pool: PgPool,
}

fn request_binds(scope: &RecordScope) -> ScopeBinds {
    ScopeBinds::new(scope, |s| matches!(s, RecordScope::Own(_)))
}

impl AttendanceRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        scope: &RecordScope,
        status: Option<ApprovalStatus>,
    ) -> Result<Vec<AttendanceEditEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_attendance_requests");
        let binds = request_binds(scope);
        let result = sqlx::query_as::<_, AttendanceEditEntity>(
            r#"
            SELECT id, requester_id, date, reason, admin_approved, dean_approved,
                   hod_approved, status, timestamp
            FROM attendance_edit_requests
            WHERE NOT $1
              AND ($2::uuid IS NULL OR requester_id = $2)
              AND ($3::approval_status IS NULL OR status = $3)
            ORDER BY timestamp DESC
            "#,
        )
        .bind(binds.deny)
        .bind(binds.own)
        .bind(status)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
        scope: &RecordScope,
    ) -> Result<Option<AttendanceEditEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_attendance_request_by_id");
        let binds = request_binds(scope);
        let result = sqlx::query_as::<_, AttendanceEditEntity>(
            r#"
            SELECT id, requester_id, date, reason, admin_approved, dean_approved,
                   hod_approved, status, timestamp
            FROM attendance_edit_requests
            WHERE NOT $1 AND ($2::uuid IS NULL OR requester_id = $2) AND id = $3
            "#,
        )
        .bind(binds.deny)
        .bind(binds.own)
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Whether `requester_id` holds a fully approved request for `date`.
    pub async fn has_approved(
        &self,
        requester_id: Uuid,
        date: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("has_approved_attendance_request");
        let result = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM attendance_edit_requests
                WHERE requester_id = $1 AND date = $2 AND status = 'APPROVED'
            )
            "#,
        )
        .bind(requester_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(
        &self,
        requester_id: Uuid,
        date: NaiveDate,
        reason: &str,
    ) -> Result<AttendanceEditEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_attendance_request");
        let result = sqlx::query_as::<_, AttendanceEditEntity>(
            r#"
            INSERT INTO attendance_edit_requests (requester_id, date, reason)
            VALUES ($1, $2, $3)
            RETURNING id, requester_id, date, reason, admin_approved, dean_approved,
                      hod_approved, status, timestamp
            "#,
        )
        .bind(requester_id)
        .bind(date)
        .bind(reason)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Edits a pending request.
    pub async fn update_pending(
        &self,
        id: Uuid,
        date: Option<NaiveDate>,
        reason: Option<&str>,
    ) -> Result<AttendanceEditEntity, RepositoryError> {
        let timer = QueryTimer::new("update_attendance_request");
        let mut tx = self.pool.begin().await?;

        let status = sqlx::query_scalar::<_, ApprovalStatus>(
            "SELECT status FROM attendance_edit_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound("Attendance request"))?;

        if status.is_decided() {
            return Err(WorkflowError::AlreadyDecided { status }.into());
        }

        let entity = sqlx::query_as::<_, AttendanceEditEntity>(
            r#"
            UPDATE attendance_edit_requests SET
                date = COALESCE($2, date),
                reason = COALESCE($3, reason)
            WHERE id = $1
            RETURNING id, requester_id, date, reason, admin_approved, dean_approved,
                      hod_approved, status, timestamp
            "#,
        )
        .bind(id)
        .bind(date)
        .bind(reason)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(entity)
    }

    /// Records one approver's decision under a row lock. Each approval is
    /// reported to the requester.
    pub async fn decide(
        &self,
        id: Uuid,
        flag: ApprovalFlag,
        decision: Decision,
    ) -> Result<AttendanceEditEntity, RepositoryError> {
        let timer = QueryTimer::new("decide_attendance_request");
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, AttendanceEditEntity>(
            r#"
            SELECT id, requester_id, date, reason, admin_approved, dean_approved,
                   hod_approved, status, timestamp
            FROM attendance_edit_requests
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound("Attendance request"))?;

        let (flags, status) = current
            .approvals()
            .record(current.status, flag, decision)?;

        let entity = sqlx::query_as::<_, AttendanceEditEntity>(
            r#"
            UPDATE attendance_edit_requests SET
                admin_approved = $2,
                dean_approved = $3,
                hod_approved = $4,
                status = $5
            WHERE id = $1
            RETURNING id, requester_id, date, reason, admin_approved, dean_approved,
                      hod_approved, status, timestamp
            "#,
        )
        .bind(id)
        .bind(flags.admin)
        .bind(flags.dean)
        .bind(flags.hod)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        if decision == Decision::Approve {
            let notice = DecisionNotice::AttendanceEdit {
                approver: flag.as_str(),
                date: entity.date,
            };
            NotificationRepository::notify_in(&mut tx, entity.requester_id, &notice).await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(entity)
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_attendance_request");
        let result = sqlx::query("DELETE FROM attendance_edit_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }
}
