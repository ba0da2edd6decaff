//! Attendance repository for database operations.

use chrono::NaiveDate;
use domain::models::attendance::ListAttendanceQuery;
use domain::models::HourAttendance;
use domain::services::RecordScope;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::ScopeBinds;
use crate::entities::AttendanceEntity;
use crate::metrics::QueryTimer;

/// Repository for daily attendance and its hour entries.
#[derive(Clone)]
pub struct AttendanceRepository {
    pool: PgPool,
}

/// A fully resolved attendance row ready to insert.
#[derive(Debug, Clone)]
pub struct NewAttendance<'a> {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub is_present: bool,
    pub marked_by: Uuid,
    pub hours: &'a [HourAttendance],
}

const SELECT_ATTENDANCE: &str = r#"
    SELECT r.id, r.user_id, r.date, r.is_present, r.marked_by, r.created_at,
           COALESCE(
               (SELECT json_agg(json_build_object('hour', h.hour, 'status', h.status,
                                                  'detail', h.detail) ORDER BY h.hour)
                FROM hour_attendance h WHERE h.record_id = r.id),
               '[]'::json
           ) AS hours
    FROM attendance_records r
"#;

fn attendance_binds(scope: &RecordScope) -> ScopeBinds {
    ScopeBinds::new(scope, |s| matches!(s, RecordScope::Own(_)))
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        scope: &RecordScope,
        query: &ListAttendanceQuery,
    ) -> Result<Vec<AttendanceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_attendance");
        let binds = attendance_binds(scope);
        let sql = format!(
            "{SELECT_ATTENDANCE}
             WHERE NOT $1
               AND ($2::uuid IS NULL OR r.user_id = $2)
               AND ($3::uuid IS NULL OR r.user_id = $3)
               AND ($4::date IS NULL OR r.date = $4)
             ORDER BY r.date DESC, r.user_id"
        );
        let result = sqlx::query_as::<_, AttendanceEntity>(&sql)
            .bind(binds.deny)
            .bind(binds.own)
            .bind(query.user)
            .bind(query.date)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
        scope: &RecordScope,
    ) -> Result<Option<AttendanceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_attendance_by_id");
        let binds = attendance_binds(scope);
        let sql = format!(
            "{SELECT_ATTENDANCE}
             WHERE NOT $1 AND ($2::uuid IS NULL OR r.user_id = $2) AND r.id = $3"
        );
        let result = sqlx::query_as::<_, AttendanceEntity>(&sql)
            .bind(binds.deny)
            .bind(binds.own)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    async fn fetch_in(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<AttendanceEntity, sqlx::Error> {
        let sql = format!("{SELECT_ATTENDANCE} WHERE r.id = $1");
        sqlx::query_as::<_, AttendanceEntity>(&sql)
            .bind(id)
            .fetch_one(&mut **tx)
            .await
    }

    async fn insert_hours(
        tx: &mut Transaction<'_, Postgres>,
        record_id: Uuid,
        hours: &[HourAttendance],
    ) -> Result<(), sqlx::Error> {
        for hour in hours {
            sqlx::query(
                r#"
                INSERT INTO hour_attendance (record_id, hour, status, detail)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(record_id)
            .bind(hour.hour)
            .bind(hour.status)
            .bind(&hour.detail)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Inserts a record and its hours in one transaction.
    pub async fn create(&self, new: NewAttendance<'_>) -> Result<AttendanceEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_attendance");
        let mut tx = self.pool.begin().await?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO attendance_records (user_id, date, is_present, marked_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(new.user_id)
        .bind(new.date)
        .bind(new.is_present)
        .bind(new.marked_by)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_hours(&mut tx, id, new.hours).await?;
        let record = Self::fetch_in(&mut tx, id).await?;

        tx.commit().await?;
        timer.record();
        Ok(record)
    }

    /// Stores a new presence flag and, when given, replaces the hour entries.
    pub async fn update(
        &self,
        id: Uuid,
        is_present: bool,
        hours: Option<&[HourAttendance]>,
        marked_by: Uuid,
    ) -> Result<Option<AttendanceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_attendance");
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE attendance_records SET is_present = $2, marked_by = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(is_present)
        .bind(marked_by)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }
        if let Some(hours) = hours {
            sqlx::query("DELETE FROM hour_attendance WHERE record_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            Self::insert_hours(&mut tx, id, hours).await?;
        }
        let record = Self::fetch_in(&mut tx, id).await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(record))
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_attendance");
        let result = sqlx::query("DELETE FROM attendance_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }
}
