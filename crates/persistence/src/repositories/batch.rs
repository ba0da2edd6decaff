//! Academic batch and curriculum status repository.

use domain::models::batch::{CreateBatchRequest, ListCurriculumQuery, UpdateBatchRequest};
use domain::models::CurriculumStatus;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::entities::{BatchEntity, CurriculumEntity};
use crate::metrics::QueryTimer;

/// Repository for batches and their per-course curriculum status.
#[derive(Clone)]
pub struct BatchRepository {
    pool: PgPool,
}

const SELECT_BATCH: &str = r#"
    SELECT b.id, b.name, b.start_year, b.end_year, b.batch_type,
           ARRAY(SELECT bc.course_id FROM batch_courses bc
                 WHERE bc.batch_id = b.id ORDER BY bc.course_id) AS courses
    FROM academic_batches b
"#;

impl BatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<BatchEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_batches");
        let sql = format!("{SELECT_BATCH} ORDER BY b.start_year DESC, b.name");
        let result = sqlx::query_as::<_, BatchEntity>(&sql)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<BatchEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_batch_by_id");
        let sql = format!("{SELECT_BATCH} WHERE b.id = $1");
        let result = sqlx::query_as::<_, BatchEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    async fn replace_courses(
        tx: &mut Transaction<'_, Postgres>,
        batch_id: Uuid,
        courses: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM batch_courses WHERE batch_id = $1")
            .bind(batch_id)
            .execute(&mut **tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO batch_courses (batch_id, course_id)
            SELECT $1, course FROM UNNEST($2::uuid[]) AS course
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(batch_id)
        .bind(courses)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn create(&self, req: &CreateBatchRequest) -> Result<BatchEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_batch");
        let mut tx = self.pool.begin().await?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO academic_batches (name, start_year, end_year, batch_type)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&req.name)
        .bind(req.start_year)
        .bind(req.end_year)
        .bind(req.batch_type)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_courses(&mut tx, id, &req.courses).await?;
        let sql = format!("{SELECT_BATCH} WHERE b.id = $1");
        let batch = sqlx::query_as::<_, BatchEntity>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(batch)
    }

    /// Partial update. The year-span check constraint guards the merged row.
    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateBatchRequest,
    ) -> Result<Option<BatchEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_batch");
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE academic_batches SET
                name = COALESCE($2, name),
                start_year = COALESCE($3, start_year),
                end_year = COALESCE($4, end_year),
                batch_type = COALESCE($5, batch_type)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(req.start_year)
        .bind(req.end_year)
        .bind(req.batch_type)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }
        if let Some(courses) = &req.courses {
            Self::replace_courses(&mut tx, id, courses).await?;
        }
        let sql = format!("{SELECT_BATCH} WHERE b.id = $1");
        let batch = sqlx::query_as::<_, BatchEntity>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(batch))
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_batch");
        let result = sqlx::query("DELETE FROM academic_batches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }

    pub async fn list_curricula(
        &self,
        query: &ListCurriculumQuery,
    ) -> Result<Vec<CurriculumEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_curricula");
        let result = sqlx::query_as::<_, CurriculumEntity>(
            r#"
            SELECT id, batch_id, course_id, status
            FROM batch_course_curricula
            WHERE ($1::uuid IS NULL OR batch_id = $1)
              AND ($2::uuid IS NULL OR course_id = $2)
            ORDER BY batch_id, course_id
            "#,
        )
        .bind(query.batch)
        .bind(query.course)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_curriculum(&self, id: Uuid) -> Result<Option<CurriculumEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_curriculum_by_id");
        let result = sqlx::query_as::<_, CurriculumEntity>(
            "SELECT id, batch_id, course_id, status FROM batch_course_curricula WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Status for a batch/course pair. A missing row means the curriculum is frozen.
    pub async fn curriculum_status(
        &self,
        batch_id: Uuid,
        course_id: Uuid,
    ) -> Result<CurriculumStatus, sqlx::Error> {
        let timer = QueryTimer::new("curriculum_status");
        let result = sqlx::query_scalar::<_, CurriculumStatus>(
            "SELECT status FROM batch_course_curricula WHERE batch_id = $1 AND course_id = $2",
        )
        .bind(batch_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map(|status| status.unwrap_or(CurriculumStatus::Frozen));
        timer.record();
        result
    }

    pub async fn create_curriculum(
        &self,
        batch_id: Uuid,
        course_id: Uuid,
        status: CurriculumStatus,
    ) -> Result<CurriculumEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_curriculum");
        let result = sqlx::query_as::<_, CurriculumEntity>(
            r#"
            INSERT INTO batch_course_curricula (batch_id, course_id, status)
            VALUES ($1, $2, $3)
            RETURNING id, batch_id, course_id, status
            "#,
        )
        .bind(batch_id)
        .bind(course_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Sets the curriculum status. Setting the current value again is a no-op.
    pub async fn set_curriculum_status(
        &self,
        id: Uuid,
        status: CurriculumStatus,
    ) -> Result<Option<CurriculumEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_curriculum_status");
        let result = sqlx::query_as::<_, CurriculumEntity>(
            r#"
            UPDATE batch_course_curricula SET status = $2
            WHERE id = $1
            RETURNING id, batch_id, course_id, status
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete_curriculum(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_curriculum");
        let result = sqlx::query("DELETE FROM batch_course_curricula WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }
}
