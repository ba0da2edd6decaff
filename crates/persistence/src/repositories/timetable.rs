//! Timetable repository.

use domain::models::timetable::{
    CreateTimetableRequest, ListTimetablesQuery, UpdateTimetableRequest,
};
use domain::models::HourAssignment;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::entities::TimetableEntity;
use crate::metrics::QueryTimer;

/// Repository for per-cohort timetables and their hour assignments.
#[derive(Clone)]
pub struct TimetableRepository {
    pool: PgPool,
}

const SELECT_TIMETABLE: &str = r#"
    SELECT t.id, t.department, t.study_year, t.last_updated,
           COALESCE(
               (SELECT json_agg(json_build_object('hour', a.hour, 'staff', a.staff_id)
                                ORDER BY a.hour)
                FROM hour_assignments a WHERE a.timetable_id = t.id),
               '[]'::json
           ) AS assignments
    FROM timetables t
"#;

impl TimetableRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        query: &ListTimetablesQuery,
    ) -> Result<Vec<TimetableEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_timetables");
        let sql = format!(
            "{SELECT_TIMETABLE}
             WHERE ($1::text IS NULL OR t.department = $1)
               AND ($2::text IS NULL OR t.study_year = $2)
             ORDER BY t.department, t.study_year"
        );
        let result = sqlx::query_as::<_, TimetableEntity>(&sql)
            .bind(&query.department)
            .bind(&query.study_year)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TimetableEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_timetable_by_id");
        let sql = format!("{SELECT_TIMETABLE} WHERE t.id = $1");
        let result = sqlx::query_as::<_, TimetableEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    async fn fetch_in(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<TimetableEntity, sqlx::Error> {
        let sql = format!("{SELECT_TIMETABLE} WHERE t.id = $1");
        sqlx::query_as::<_, TimetableEntity>(&sql)
            .bind(id)
            .fetch_one(&mut **tx)
            .await
    }

    async fn replace_assignments(
        tx: &mut Transaction<'_, Postgres>,
        timetable_id: Uuid,
        assignments: &[HourAssignment],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM hour_assignments WHERE timetable_id = $1")
            .bind(timetable_id)
            .execute(&mut **tx)
            .await?;
        for assignment in assignments {
            sqlx::query(
                "INSERT INTO hour_assignments (timetable_id, hour, staff_id) VALUES ($1, $2, $3)",
            )
            .bind(timetable_id)
            .bind(assignment.hour)
            .bind(assignment.staff_id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    pub async fn create(
        &self,
        req: &CreateTimetableRequest,
    ) -> Result<TimetableEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_timetable");
        let mut tx = self.pool.begin().await?;

        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO timetables (department, study_year) VALUES ($1, $2) RETURNING id",
        )
        .bind(&req.department)
        .bind(&req.study_year)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_assignments(&mut tx, id, &req.assignments).await?;
        let timetable = Self::fetch_in(&mut tx, id).await?;

        tx.commit().await?;
        timer.record();
        Ok(timetable)
    }

    /// Partial update. Supplied assignments replace the whole set.
    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateTimetableRequest,
    ) -> Result<Option<TimetableEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_timetable");
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE timetables SET
                department = COALESCE($2, department),
                study_year = COALESCE($3, study_year),
                last_updated = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&req.department)
        .bind(&req.study_year)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }

        if let Some(assignments) = &req.assignments {
            Self::replace_assignments(&mut tx, id, assignments).await?;
        }
        let timetable = Self::fetch_in(&mut tx, id).await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(timetable))
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_timetable");
        let result = sqlx::query("DELETE FROM timetables WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }
}
