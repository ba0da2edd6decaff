//! Subject repository for database operations.

use domain::models::subject::{CreateSubjectRequest, ListSubjectsQuery, UpdateSubjectRequest};
use domain::models::{CurriculumStatus, UserRole};
use domain::services::workflow;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::entities::SubjectEntity;
use crate::error::RepositoryError;
use crate::metrics::QueryTimer;

/// Repository for subject database operations.
#[derive(Clone)]
pub struct SubjectRepository {
    pool: PgPool,
}

const SELECT_SUBJECT: &str = r#"
    SELECT s.id, s.course_id, s.code, s.name, s.credits, s.semester, s.lessons_count,
           s.materials, s.lesson_names,
           ARRAY(SELECT ss.staff_id FROM subject_staff ss
                 WHERE ss.subject_id = s.id ORDER BY ss.staff_id) AS assigned_staff
    FROM subjects s
"#;

impl SubjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &ListSubjectsQuery) -> Result<Vec<SubjectEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_subjects");
        let sql = format!(
            "{SELECT_SUBJECT}
             WHERE ($1::uuid IS NULL OR s.course_id = $1)
               AND ($2::int IS NULL OR s.semester = $2)
             ORDER BY s.semester, s.code"
        );
        let result = sqlx::query_as::<_, SubjectEntity>(&sql)
            .bind(query.course)
            .bind(query.semester)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Subjects of the given courses, for embedding in course listings.
    pub async fn list_for_courses(
        &self,
        course_ids: &[Uuid],
    ) -> Result<Vec<SubjectEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_subjects_for_courses");
        let sql = format!(
            "{SELECT_SUBJECT} WHERE s.course_id = ANY($1) ORDER BY s.semester, s.code"
        );
        let result = sqlx::query_as::<_, SubjectEntity>(&sql)
            .bind(course_ids)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<SubjectEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_subject_by_id");
        let sql = format!("{SELECT_SUBJECT} WHERE s.id = $1");
        let result = sqlx::query_as::<_, SubjectEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    async fn fetch_in(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<SubjectEntity, sqlx::Error> {
        let sql = format!("{SELECT_SUBJECT} WHERE s.id = $1");
        sqlx::query_as::<_, SubjectEntity>(&sql)
            .bind(id)
            .fetch_one(&mut **tx)
            .await
    }

    /// Checks that `editor` may change subjects of `course_id`. A course is
    /// open when any batch offering it has an EDITABLE curriculum; that row is
    /// share-locked until the transaction ends.
    async fn guard_curriculum(
        tx: &mut Transaction<'_, Postgres>,
        course_id: Uuid,
        editor: UserRole,
    ) -> Result<(), RepositoryError> {
        if editor == UserRole::Admin {
            return Ok(());
        }
        let status = sqlx::query_scalar::<_, CurriculumStatus>(
            r#"
            SELECT status FROM batch_course_curricula
            WHERE course_id = $1 AND status = 'EDITABLE'
            LIMIT 1
            FOR SHARE
            "#,
        )
        .bind(course_id)
        .fetch_optional(&mut **tx)
        .await?
        .unwrap_or(CurriculumStatus::Frozen);
        workflow::ensure_curriculum_editable(editor, status)?;
        Ok(())
    }

    /// Locks a subject row and returns its course.
    async fn lock_course_of(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT course_id FROM subjects WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    async fn replace_staff(
        tx: &mut Transaction<'_, Postgres>,
        subject_id: Uuid,
        staff: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM subject_staff WHERE subject_id = $1")
            .bind(subject_id)
            .execute(&mut **tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO subject_staff (subject_id, staff_id)
            SELECT $1, staff FROM UNNEST($2::uuid[]) AS staff
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(subject_id)
        .bind(staff)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn create(
        &self,
        req: &CreateSubjectRequest,
        editor: UserRole,
    ) -> Result<SubjectEntity, RepositoryError> {
        let timer = QueryTimer::new("create_subject");
        let mut tx = self.pool.begin().await?;
        Self::guard_curriculum(&mut tx, req.course, editor).await?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO subjects (course_id, code, name, credits, semester, lessons_count,
                                  materials, lesson_names)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(req.course)
        .bind(&req.code)
        .bind(&req.name)
        .bind(req.credits)
        .bind(req.semester)
        .bind(req.lessons_count)
        .bind(&req.materials)
        .bind(&req.lesson_names)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_staff(&mut tx, id, &req.assigned_staff).await?;
        let subject = Self::fetch_in(&mut tx, id).await?;

        tx.commit().await?;
        timer.record();
        Ok(subject)
    }

    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateSubjectRequest,
        editor: UserRole,
    ) -> Result<Option<SubjectEntity>, RepositoryError> {
        let timer = QueryTimer::new("update_subject");
        let mut tx = self.pool.begin().await?;

        let Some(course_id) = Self::lock_course_of(&mut tx, id).await? else {
            return Ok(None);
        };
        Self::guard_curriculum(&mut tx, course_id, editor).await?;
        if let Some(target) = req.course.filter(|c| *c != course_id) {
            Self::guard_curriculum(&mut tx, target, editor).await?;
        }

        let updated = sqlx::query(
            r#"
            UPDATE subjects SET
                course_id = COALESCE($2, course_id),
                code = COALESCE($3, code),
                name = COALESCE($4, name),
                credits = COALESCE($5, credits),
                semester = COALESCE($6, semester),
                lessons_count = COALESCE($7, lessons_count),
                materials = COALESCE($8, materials),
                lesson_names = COALESCE($9, lesson_names)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(req.course)
        .bind(&req.code)
        .bind(&req.name)
        .bind(req.credits)
        .bind(req.semester)
        .bind(req.lessons_count)
        .bind(&req.materials)
        .bind(&req.lesson_names)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }
        if let Some(staff) = &req.assigned_staff {
            Self::replace_staff(&mut tx, id, staff).await?;
        }
        let subject = Self::fetch_in(&mut tx, id).await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(subject))
    }

    /// Replaces the material list. Returns `None` if the subject does not exist.
    pub async fn update_materials(
        &self,
        id: Uuid,
        materials: &[String],
    ) -> Result<Option<SubjectEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_subject_materials");
        let updated = sqlx::query("UPDATE subjects SET materials = $2 WHERE id = $1")
            .bind(id)
            .bind(materials)
            .execute(&self.pool)
            .await?
            .rows_affected();
        timer.record();

        if updated == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    /// Deletes a subject. Returns `false` if it does not exist.
    pub async fn delete(&self, id: Uuid, editor: UserRole) -> Result<bool, RepositoryError> {
        let timer = QueryTimer::new("delete_subject");
        let mut tx = self.pool.begin().await?;

        let Some(course_id) = Self::lock_course_of(&mut tx, id).await? else {
            return Ok(false);
        };
        Self::guard_curriculum(&mut tx, course_id, editor).await?;
        sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(true)
    }
}
