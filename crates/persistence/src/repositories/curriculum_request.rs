//! Curriculum edit request repository.

use chrono::Utc;
use domain::models::{ApprovalStatus, CurriculumStatus, Decision, DecisionNotice};
use domain::services::workflow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::CurriculumRequestEntity;
use crate::error::RepositoryError;
use crate::metrics::QueryTimer;
use crate::repositories::NotificationRepository;

/// Repository for HOD requests to reopen a frozen curriculum.
#[derive(Clone)]
pub struct CurriculumRequestRepository {
    pool: PgPool,
}

impl CurriculumRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        status: Option<ApprovalStatus>,
    ) -> Result<Vec<CurriculumRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_curriculum_requests");
        let result = sqlx::query_as::<_, CurriculumRequestEntity>(
            r#"
            SELECT id, hod_id, batch_id, course_id, dept_name, batch_name, reason, status,
                   decided_by, decided_at, timestamp
            FROM curriculum_edit_requests
            WHERE ($1::approval_status IS NULL OR status = $1)
            ORDER BY timestamp DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<CurriculumRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_curriculum_request_by_id");
        let result = sqlx::query_as::<_, CurriculumRequestEntity>(
            r#"
            SELECT id, hod_id, batch_id, course_id, dept_name, batch_name, reason, status,
                   decided_by, decided_at, timestamp
            FROM curriculum_edit_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Files a request for a frozen batch/course curriculum. Display names are
    /// captured from the batch and course at filing time.
    pub async fn create(
        &self,
        hod_id: Uuid,
        batch_id: Uuid,
        course_id: Uuid,
        reason: &str,
    ) -> Result<CurriculumRequestEntity, RepositoryError> {
        let timer = QueryTimer::new("create_curriculum_request");
        let mut tx = self.pool.begin().await?;

        let batch_name: String =
            sqlx::query_scalar("SELECT name FROM academic_batches WHERE id = $1")
                .bind(batch_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound("Batch"))?;
        let dept_name: String = sqlx::query_scalar("SELECT name FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound("Course"))?;

        let status = sqlx::query_scalar::<_, CurriculumStatus>(
            "SELECT status FROM batch_course_curricula WHERE batch_id = $1 AND course_id = $2",
        )
        .bind(batch_id)
        .bind(course_id)
        .fetch_optional(&mut *tx)
        .await?
        .unwrap_or(CurriculumStatus::Frozen);
        workflow::ensure_curriculum_frozen(status)?;

        let entity = sqlx::query_as::<_, CurriculumRequestEntity>(
            r#"
            INSERT INTO curriculum_edit_requests (hod_id, batch_id, course_id, dept_name,
                                                  batch_name, reason)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, hod_id, batch_id, course_id, dept_name, batch_name, reason, status,
                      decided_by, decided_at, timestamp
            "#,
        )
        .bind(hod_id)
        .bind(batch_id)
        .bind(course_id)
        .bind(&dept_name)
        .bind(&batch_name)
        .bind(reason)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(entity)
    }

    /// Decides a pending request and notifies the HOD. Approval opens the
    /// linked curriculum for editing in the same transaction.
    pub async fn decide(
        &self,
        id: Uuid,
        decision: Decision,
        decided_by: Uuid,
    ) -> Result<CurriculumRequestEntity, RepositoryError> {
        let timer = QueryTimer::new("decide_curriculum_request");
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, ApprovalStatus>(
            "SELECT status FROM curriculum_edit_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound("Curriculum request"))?;
        let next = workflow::decide(current, decision)?;

        let entity = sqlx::query_as::<_, CurriculumRequestEntity>(
            r#"
            UPDATE curriculum_edit_requests
            SET status = $2, decided_by = $3, decided_at = $4
            WHERE id = $1
            RETURNING id, hod_id, batch_id, course_id, dept_name, batch_name, reason, status,
                      decided_by, decided_at, timestamp
            "#,
        )
        .bind(id)
        .bind(next)
        .bind(decided_by)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        if next == ApprovalStatus::Approved {
            sqlx::query(
                r#"
                INSERT INTO batch_course_curricula (batch_id, course_id, status)
                VALUES ($1, $2, 'EDITABLE')
                ON CONFLICT (batch_id, course_id) DO UPDATE SET status = 'EDITABLE'
                "#,
            )
            .bind(entity.batch_id)
            .bind(entity.course_id)
            .execute(&mut *tx)
            .await?;
        }

        let notice = DecisionNotice::Curriculum {
            dept_name: &entity.dept_name,
            batch_name: &entity.batch_name,
            status: next,
        };
        NotificationRepository::notify_in(&mut tx, entity.hod_id, &notice).await?;

        tx.commit().await?;
        timer.record();
        Ok(entity)
    }

    /// Updates the reason of a pending request.
    pub async fn update_reason(
        &self,
        id: Uuid,
        reason: &str,
    ) -> Result<CurriculumRequestEntity, RepositoryError> {
        let timer = QueryTimer::new("update_curriculum_request");
        let mut tx = self.pool.begin().await?;

        let status = sqlx::query_scalar::<_, ApprovalStatus>(
            "SELECT status FROM curriculum_edit_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound("Curriculum request"))?;
        if status.is_decided() {
            return Err(domain::errors::WorkflowError::AlreadyDecided { status }.into());
        }

        let entity = sqlx::query_as::<_, CurriculumRequestEntity>(
            r#"
            UPDATE curriculum_edit_requests SET reason = $2
            WHERE id = $1
            RETURNING id, hod_id, batch_id, course_id, dept_name, batch_name, reason, status,
                      decided_by, decided_at, timestamp
            "#,
        )
        .bind(id)
        .bind(reason)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(entity)
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_curriculum_request");
        let result = sqlx::query("DELETE FROM curriculum_edit_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }
}
