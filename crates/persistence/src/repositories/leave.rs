//! Leave request repository.

use chrono::Utc;
use domain::errors::WorkflowError;
use domain::models::leave::{CreateLeaveRequest, UpdateLeaveRequest};
use domain::models::{ApprovalStatus, Decision, DecisionNotice};
use domain::services::{workflow, RecordScope};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::ScopeBinds;
use crate::entities::LeaveEntity;
use crate::error::RepositoryError;
use crate::metrics::QueryTimer;
use crate::repositories::NotificationRepository;

/// Repository for student leave requests.
#[derive(Clone)]
pub struct LeaveRepository {
    pool: PgPool,
}

const SELECT_LEAVE: &str = r#"
    SELECT l.id, l.student_id, u.name AS student_name, l.mentor_id, l.leave_type,
           l.start_date, l.start_time, l.end_date, l.end_time, l.reason, l.status,
           l.decided_by, l.decided_at, l.created_at
    FROM leave_requests l
    JOIN users u ON u.id = l.student_id
"#;

const LEAVE_SCOPE: &str = r#"
    NOT $1
    AND ($2::uuid IS NULL OR l.student_id = $2)
    AND ($3::uuid IS NULL OR l.mentor_id = $3)
"#;

fn leave_binds(scope: &RecordScope) -> ScopeBinds {
    ScopeBinds::new(scope, |s| {
        matches!(s, RecordScope::Own(_) | RecordScope::MentoredBy(_))
    })
}

impl LeaveRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        scope: &RecordScope,
        status: Option<ApprovalStatus>,
    ) -> Result<Vec<LeaveEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_leaves");
        let binds = leave_binds(scope);
        let sql = format!(
            "{SELECT_LEAVE}
             WHERE {LEAVE_SCOPE} AND ($4::approval_status IS NULL OR l.status = $4)
             ORDER BY l.created_at DESC"
        );
        let result = sqlx::query_as::<_, LeaveEntity>(&sql)
            .bind(binds.deny)
            .bind(binds.own)
            .bind(binds.mentor)
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
    ) -> Result<Option<LeaveEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_leave_by_id");
        let binds = leave_binds(scope);
        let sql = format!("{SELECT_LEAVE} WHERE {LEAVE_SCOPE} AND l.id = $4");
        let result = sqlx::query_as::<_, LeaveEntity>(&sql)
            .bind(binds.deny)
            .bind(binds.own)
            .bind(binds.mentor)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    async fn fetch_in(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<LeaveEntity, sqlx::Error> {
        let sql = format!("{SELECT_LEAVE} WHERE l.id = $1");
        sqlx::query_as::<_, LeaveEntity>(&sql)
            .bind(id)
            .fetch_one(&mut **tx)
            .await
    }

    /// Locks the request row and returns its status.
    async fn lock_status(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<ApprovalStatus, RepositoryError> {
        sqlx::query_scalar::<_, ApprovalStatus>(
            "SELECT status FROM leave_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(RepositoryError::NotFound("Leave request"))
    }

    /// Files a leave request routed to the student's current mentor.
    pub async fn create(
        &self,
        student_id: Uuid,
        mentor_id: Option<Uuid>,
        req: &CreateLeaveRequest,
    ) -> Result<LeaveEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_leave");
        let mut tx = self.pool.begin().await?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO leave_requests (student_id, mentor_id, leave_type, start_date, start_time,
                                        end_date, end_time, reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(student_id)
        .bind(mentor_id)
        .bind(req.leave_type)
        .bind(req.start_date)
        .bind(req.start_time)
        .bind(req.end_date)
        .bind(req.end_time)
        .bind(&req.reason)
        .fetch_one(&mut *tx)
        .await?;

        let leave = Self::fetch_in(&mut tx, id).await?;
        tx.commit().await?;
        timer.record();
        Ok(leave)
    }

    /// Edits a request that is still pending. The date-order check constraint
    /// guards the merged row.
    pub async fn update_pending(
        &self,
        id: Uuid,
        req: &UpdateLeaveRequest,
    ) -> Result<LeaveEntity, RepositoryError> {
        let timer = QueryTimer::new("update_leave");
        let mut tx = self.pool.begin().await?;

        let status = Self::lock_status(&mut tx, id).await?;
        if status.is_decided() {
            return Err(WorkflowError::AlreadyDecided { status }.into());
        }

        sqlx::query(
            r#"
            UPDATE leave_requests SET
                leave_type = COALESCE($2, leave_type),
                start_date = COALESCE($3, start_date),
                start_time = COALESCE($4, start_time),
                end_date = COALESCE($5, end_date),
                end_time = COALESCE($6, end_time),
                reason = COALESCE($7, reason)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(req.leave_type)
        .bind(req.start_date)
        .bind(req.start_time)
        .bind(req.end_date)
        .bind(req.end_time)
        .bind(&req.reason)
        .execute(&mut *tx)
        .await?;

        let leave = Self::fetch_in(&mut tx, id).await?;
        tx.commit().await?;
        timer.record();
        Ok(leave)
    }

    /// Approves or rejects a pending request.
    pub async fn decide(
        &self,
        id: Uuid,
        decision: Decision,
        decided_by: Uuid,
    ) -> Result<LeaveEntity, RepositoryError> {
        let timer = QueryTimer::new("decide_leave");
        let mut tx = self.pool.begin().await?;

        let current = Self::lock_status(&mut tx, id).await?;
        let next = workflow::decide(current, decision)?;

        sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = $2, decided_by = $3, decided_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(next)
        .bind(decided_by)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let leave = Self::fetch_in(&mut tx, id).await?;
        let notice = DecisionNotice::Leave {
            start_date: leave.start_date,
            status: next,
        };
        NotificationRepository::notify_in(&mut tx, leave.student_id, &notice).await?;

        tx.commit().await?;
        timer.record();
        Ok(leave)
    }

    /// Removes a request that has not been decided yet.
    pub async fn delete_pending(&self, id: Uuid) -> Result<(), RepositoryError> {
        let timer = QueryTimer::new("delete_leave");
        let mut tx = self.pool.begin().await?;

        let status = Self::lock_status(&mut tx, id).await?;
        if status.is_decided() {
            return Err(WorkflowError::AlreadyDecided { status }.into());
        }
        sqlx::query("DELETE FROM leave_requests WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(())
    }
}
