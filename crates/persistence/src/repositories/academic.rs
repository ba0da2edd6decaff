//! Postgres-backed source for academic standing aggregation.

use async_trait::async_trait;
use domain::models::UserRole;
use domain::services::{AcademicRecordSource, AttendanceTally};
use sqlx::PgPool;
use uuid::Uuid;

use crate::metrics::QueryTimer;

/// Reads attendance and mark figures for [`domain::services::AcademicService`].
#[derive(Clone)]
pub struct AcademicRecordRepository {
    pool: PgPool,
}

impl AcademicRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AcademicRecordSource for AcademicRecordRepository {
    type Error = sqlx::Error;

    async fn role_of(&self, user_id: Uuid) -> Result<Option<UserRole>, sqlx::Error> {
        let timer = QueryTimer::new("academic_role_of");
        let result = sqlx::query_scalar::<_, UserRole>("SELECT role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    async fn attendance_tally(&self, student_id: Uuid) -> Result<AttendanceTally, sqlx::Error> {
        let timer = QueryTimer::new("academic_attendance_tally");
        let result = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*) FILTER (WHERE is_present), COUNT(*)
            FROM attendance_records
            WHERE user_id = $1
            "#,
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map(|(present, total)| AttendanceTally { present, total });
        timer.record();
        result
    }

    async fn mark_values(&self, student_id: Uuid) -> Result<Vec<f64>, sqlx::Error> {
        let timer = QueryTimer::new("academic_mark_values");
        let result =
            sqlx::query_scalar::<_, f64>("SELECT marks FROM mark_records WHERE student_id = $1")
                .bind(student_id)
                .fetch_all(&self.pool)
                .await;
        timer.record();
        result
    }
}
