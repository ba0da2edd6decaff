//! Mark batch and mark record repository.
//!
//! Record writes take a shared lock on the parent batch row, so a concurrent
//! status change cannot slip between the OPEN check and the write.

use domain::models::mark::{
    CreateMarkBatchRequest, CreateMarkRecordRequest, ListMarkRecordsQuery, UpdateMarkBatchRequest,
};
use domain::models::MarkBatchStatus;
use domain::services::{workflow, RecordScope};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::ScopeBinds;
use crate::entities::{MarkBatchEntity, MarkRecordEntity};
use crate::error::RepositoryError;
use crate::metrics::QueryTimer;

/// Repository for mark batches and the records entered under them.
#[derive(Clone)]
pub struct MarkRepository {
    pool: PgPool,
}

const SELECT_BATCH: &str = r#"
    SELECT b.id, b.name, b.academic_year, b.status, b.created_at,
           ARRAY(SELECT ms.subject_id FROM mark_batch_subjects ms
                 WHERE ms.batch_id = b.id ORDER BY ms.subject_id) AS subjects
    FROM mark_batches b
"#;

fn record_binds(scope: &RecordScope) -> ScopeBinds {
    ScopeBinds::new(scope, |s| matches!(s, RecordScope::Own(_)))
}

impl MarkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_batches(
        &self,
        status: Option<MarkBatchStatus>,
    ) -> Result<Vec<MarkBatchEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_mark_batches");
        let sql = format!(
            "{SELECT_BATCH}
             WHERE ($1::mark_batch_status IS NULL OR b.status = $1)
             ORDER BY b.created_at DESC"
        );
        let result = sqlx::query_as::<_, MarkBatchEntity>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find_batch(&self, id: Uuid) -> Result<Option<MarkBatchEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_mark_batch_by_id");
        let sql = format!("{SELECT_BATCH} WHERE b.id = $1");
        let result = sqlx::query_as::<_, MarkBatchEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    async fn fetch_batch_in(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<MarkBatchEntity, sqlx::Error> {
        let sql = format!("{SELECT_BATCH} WHERE b.id = $1");
        sqlx::query_as::<_, MarkBatchEntity>(&sql)
            .bind(id)
            .fetch_one(&mut **tx)
            .await
    }

    async fn replace_subjects(
        tx: &mut Transaction<'_, Postgres>,
        batch_id: Uuid,
        subjects: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM mark_batch_subjects WHERE batch_id = $1")
            .bind(batch_id)
            .execute(&mut **tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO mark_batch_subjects (batch_id, subject_id)
            SELECT $1, subject FROM UNNEST($2::uuid[]) AS subject
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(batch_id)
        .bind(subjects)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Opens a new mark batch.
    pub async fn create_batch(
        &self,
        req: &CreateMarkBatchRequest,
    ) -> Result<MarkBatchEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_mark_batch");
        let mut tx = self.pool.begin().await?;

        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO mark_batches (name, academic_year) VALUES ($1, $2) RETURNING id",
        )
        .bind(&req.name)
        .bind(&req.academic_year)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_subjects(&mut tx, id, &req.subjects).await?;
        let batch = Self::fetch_batch_in(&mut tx, id).await?;

        tx.commit().await?;
        timer.record();
        Ok(batch)
    }

    /// Partial update. A status change must move the batch forward.
    pub async fn update_batch(
        &self,
        id: Uuid,
        req: &UpdateMarkBatchRequest,
    ) -> Result<MarkBatchEntity, RepositoryError> {
        let timer = QueryTimer::new("update_mark_batch");
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, MarkBatchStatus>(
            "SELECT status FROM mark_batches WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound("Mark batch"))?;

        let status = match req.status {
            Some(next) => workflow::transition_mark_batch(current, next)?,
            None => current,
        };

        sqlx::query(
            r#"
            UPDATE mark_batches SET
                name = COALESCE($2, name),
                academic_year = COALESCE($3, academic_year),
                status = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.academic_year)
        .bind(status)
        .execute(&mut *tx)
        .await?;

        if let Some(subjects) = &req.subjects {
            Self::replace_subjects(&mut tx, id, subjects).await?;
        }
        let batch = Self::fetch_batch_in(&mut tx, id).await?;

        tx.commit().await?;
        timer.record();
        Ok(batch)
    }

    pub async fn delete_batch(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_mark_batch");
        let result = sqlx::query("DELETE FROM mark_batches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }

    pub async fn list_records(
        &self,
        scope: &RecordScope,
        query: &ListMarkRecordsQuery,
    ) -> Result<Vec<MarkRecordEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_mark_records");
        let binds = record_binds(scope);
        let result = sqlx::query_as::<_, MarkRecordEntity>(
            r#"
            SELECT id, batch_id, student_id, subject_id, marks, max_marks, updated_by, updated_at
            FROM mark_records
            WHERE NOT $1
              AND ($2::uuid IS NULL OR student_id = $2)
              AND ($3::uuid IS NULL OR batch_id = $3)
              AND ($4::uuid IS NULL OR student_id = $4)
              AND ($5::uuid IS NULL OR subject_id = $5)
            ORDER BY batch_id, student_id, subject_id
            "#,
        )
        .bind(binds.deny)
        .bind(binds.own)
        .bind(query.batch)
        .bind(query.student)
        .bind(query.subject)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_record(
        &self,
        id: Uuid,
        scope: &RecordScope,
    ) -> Result<Option<MarkRecordEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_mark_record_by_id");
        let binds = record_binds(scope);
        let result = sqlx::query_as::<_, MarkRecordEntity>(
            r#"
            SELECT id, batch_id, student_id, subject_id, marks, max_marks, updated_by, updated_at
            FROM mark_records
            WHERE NOT $1 AND ($2::uuid IS NULL OR student_id = $2) AND id = $3
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

    /// Share-locks the batch row and fails unless it is OPEN.
    async fn lock_open_batch(
        tx: &mut Transaction<'_, Postgres>,
        batch_id: Uuid,
    ) -> Result<(), RepositoryError> {
        let status = sqlx::query_scalar::<_, MarkBatchStatus>(
            "SELECT status FROM mark_batches WHERE id = $1 FOR SHARE",
        )
        .bind(batch_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(RepositoryError::NotFound("Mark batch"))?;
        workflow::ensure_marks_editable(status)?;
        Ok(())
    }

    async fn record_batch(
        tx: &mut Transaction<'_, Postgres>,
        record_id: Uuid,
    ) -> Result<Uuid, RepositoryError> {
        sqlx::query_scalar::<_, Uuid>("SELECT batch_id FROM mark_records WHERE id = $1")
            .bind(record_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(RepositoryError::NotFound("Mark record"))
    }

    pub async fn create_record(
        &self,
        req: &CreateMarkRecordRequest,
        updated_by: Uuid,
    ) -> Result<MarkRecordEntity, RepositoryError> {
        let timer = QueryTimer::new("create_mark_record");
        let mut tx = self.pool.begin().await?;

        Self::lock_open_batch(&mut tx, req.batch).await?;

        let record = sqlx::query_as::<_, MarkRecordEntity>(
            r#"
            INSERT INTO mark_records (batch_id, student_id, subject_id, marks, max_marks,
                                      updated_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, batch_id, student_id, subject_id, marks, max_marks, updated_by,
                      updated_at
            "#,
        )
        .bind(req.batch)
        .bind(req.student)
        .bind(req.subject)
        .bind(req.marks)
        .bind(req.max_marks)
        .bind(updated_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(record)
    }

    /// Changes a score. The marks check constraint guards the merged row.
    pub async fn update_record(
        &self,
        id: Uuid,
        marks: Option<f64>,
        max_marks: Option<f64>,
        updated_by: Uuid,
    ) -> Result<MarkRecordEntity, RepositoryError> {
        let timer = QueryTimer::new("update_mark_record");
        let mut tx = self.pool.begin().await?;

        let batch_id = Self::record_batch(&mut tx, id).await?;
        Self::lock_open_batch(&mut tx, batch_id).await?;

        let record = sqlx::query_as::<_, MarkRecordEntity>(
            r#"
            UPDATE mark_records SET
                marks = COALESCE($2, marks),
                max_marks = COALESCE($3, max_marks),
                updated_by = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, batch_id, student_id, subject_id, marks, max_marks, updated_by,
                      updated_at
            "#,
        )
        .bind(id)
        .bind(marks)
        .bind(max_marks)
        .bind(updated_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(record)
    }

    /// Deletes a record while its batch is still OPEN.
    pub async fn delete_record(&self, id: Uuid) -> Result<(), RepositoryError> {
        let timer = QueryTimer::new("delete_mark_record");
        let mut tx = self.pool.begin().await?;

        let batch_id = Self::record_batch(&mut tx, id).await?;
        Self::lock_open_batch(&mut tx, batch_id).await?;

        sqlx::query("DELETE FROM mark_records WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(())
    }
}

