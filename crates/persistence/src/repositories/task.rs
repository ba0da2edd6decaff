//! Academic task repository for database operations.

use domain::models::task::{CreateTaskRequest, ListTasksQuery, UpdateTaskRequest};
use domain::services::RecordScope;
use sqlx::PgPool;
use uuid::Uuid;

use super::ScopeBinds;
use crate::entities::TaskEntity;
use crate::metrics::QueryTimer;

/// Repository for academic tasks.
#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

const SELECT_TASK: &str = r#"
    SELECT t.id, t.title, t.description, t.due_date, t.priority, t.status,
           t.subject_id, s.name AS subject_name, t.department, t.study_year,
           t.staff_id, u.name AS staff_name, t.created_at
    FROM academic_tasks t
    JOIN users u ON u.id = t.staff_id
    JOIN subjects s ON s.id = t.subject_id
"#;

// Cohort rows match on both department and year; NULLs compare equal.
const TASK_SCOPE: &str = r#"
    NOT $1
    AND ($2::uuid IS NULL OR t.staff_id = $2)
    AND (NOT $3 OR (t.department IS NOT DISTINCT FROM $4
                    AND t.study_year IS NOT DISTINCT FROM $5))
"#;

fn task_binds(scope: &RecordScope) -> ScopeBinds {
    ScopeBinds::new(scope, |s| {
        matches!(s, RecordScope::AuthoredBy(_) | RecordScope::Cohort { .. })
    })
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        scope: &RecordScope,
        query: &ListTasksQuery,
    ) -> Result<Vec<TaskEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_tasks");
        let binds = task_binds(scope);
        let sql = format!(
            "{SELECT_TASK}
             WHERE {TASK_SCOPE}
               AND ($6::uuid IS NULL OR t.subject_id = $6)
               AND ($7::task_status IS NULL OR t.status = $7)
             ORDER BY t.due_date, t.id"
        );
        let result = sqlx::query_as::<_, TaskEntity>(&sql)
            .bind(binds.deny)
            .bind(binds.author)
            .bind(binds.cohort)
            .bind(&binds.department)
            .bind(&binds.study_year)
            .bind(query.subject)
            .bind(query.status)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Finds a task if it is visible under `scope`.
    pub async fn find_by_id(
        &self,
        id: Uuid,
        scope: &RecordScope,
    ) -> Result<Option<TaskEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_task_by_id");
        let binds = task_binds(scope);
        let sql = format!("{SELECT_TASK} WHERE {TASK_SCOPE} AND t.id = $6");
        let result = sqlx::query_as::<_, TaskEntity>(&sql)
            .bind(binds.deny)
            .bind(binds.author)
            .bind(binds.cohort)
            .bind(&binds.department)
            .bind(&binds.study_year)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn create(
        &self,
        staff_id: Uuid,
        req: &CreateTaskRequest,
    ) -> Result<TaskEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_task");
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO academic_tasks (title, description, due_date, priority, status,
                                        subject_id, department, study_year, staff_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.due_date)
        .bind(req.priority)
        .bind(req.status)
        .bind(req.subject)
        .bind(&req.department)
        .bind(&req.study_year)
        .bind(staff_id)
        .fetch_one(&self.pool)
        .await?;
        timer.record();

        self.find_by_id(id, &RecordScope::All)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateTaskRequest,
    ) -> Result<Option<TaskEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_task");
        let updated = sqlx::query(
            r#"
            UPDATE academic_tasks SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                due_date = COALESCE($4, due_date),
                priority = COALESCE($5, priority),
                status = COALESCE($6, status),
                subject_id = COALESCE($7, subject_id),
                department = COALESCE($8, department),
                study_year = COALESCE($9, study_year)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.due_date)
        .bind(req.priority)
        .bind(req.status)
        .bind(req.subject)
        .bind(&req.department)
        .bind(&req.study_year)
        .execute(&self.pool)
        .await?
        .rows_affected();
        timer.record();

        if updated == 0 {
            return Ok(None);
        }
        self.find_by_id(id, &RecordScope::All).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_task");
        let result = sqlx::query("DELETE FROM academic_tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }
}
