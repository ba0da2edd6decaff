//! Course repository for database operations.

use domain::models::course::{CreateCourseRequest, UpdateCourseRequest};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::CourseEntity;
use crate::metrics::QueryTimer;

/// Repository for course database operations.
#[derive(Clone)]
pub struct CourseRepository {
    pool: PgPool,
}

impl CourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<CourseEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_courses");
        let result = sqlx::query_as::<_, CourseEntity>(
            "SELECT id, name, degree, domain, batch_type FROM courses ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CourseEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_course_by_id");
        let result = sqlx::query_as::<_, CourseEntity>(
            "SELECT id, name, degree, domain, batch_type FROM courses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(&self, req: &CreateCourseRequest) -> Result<CourseEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_course");
        let result = sqlx::query_as::<_, CourseEntity>(
            r#"
            INSERT INTO courses (name, degree, domain, batch_type)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, degree, domain, batch_type
            "#,
        )
        .bind(&req.name)
        .bind(&req.degree)
        .bind(&req.domain)
        .bind(req.batch_type)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateCourseRequest,
    ) -> Result<Option<CourseEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_course");
        let result = sqlx::query_as::<_, CourseEntity>(
            r#"
            UPDATE courses SET
                name = COALESCE($2, name),
                degree = COALESCE($3, degree),
                domain = COALESCE($4, domain),
                batch_type = COALESCE($5, batch_type)
            WHERE id = $1
            RETURNING id, name, degree, domain, batch_type
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.degree)
        .bind(&req.domain)
        .bind(req.batch_type)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes a course; its subjects go with it.
    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_course");
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }
}
