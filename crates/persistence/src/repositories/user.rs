//! User repository for database operations.

use domain::models::user::{CreateUserRequest, ListUsersQuery, UpdateUserRequest};
use domain::models::UserRole;
use domain::services::RecordScope;
use sqlx::PgPool;
use uuid::Uuid;

use super::{contains_pattern, ScopeBinds};
use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts an account with an already-hashed password.
    pub async fn create(
        &self,
        req: &CreateUserRequest,
        password_hash: &str,
    ) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (
                username, email, password_hash, name, role, department, study_year,
                reg_no, staff_id, designation, experience, avatar, mentor_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, username, email, password_hash, name, role, department, study_year,
                      reg_no, staff_id, designation, experience, avatar, mentor_id, is_active,
                      created_at, updated_at
            "#,
        )
        .bind(&req.username)
        .bind(&req.email)
        .bind(password_hash)
        .bind(&req.name)
        .bind(req.role)
        .bind(&req.department)
        .bind(&req.study_year)
        .bind(&req.reg_no)
        .bind(&req.staff_id)
        .bind(&req.designation)
        .bind(&req.experience)
        .bind(&req.avatar)
        .bind(req.mentor)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, username, email, password_hash, name, role, department, study_year,
                   reg_no, staff_id, designation, experience, avatar, mentor_id, is_active,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a user by username or (case-insensitive) email, for sign-in.
    pub async fn find_by_login(&self, login: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_login");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, username, email, password_hash, name, role, department, study_year,
                   reg_no, staff_id, designation, experience, avatar, mentor_id, is_active,
                   created_at, updated_at
            FROM users
            WHERE username = $1 OR LOWER(email) = LOWER($1)
            ORDER BY (username = $1) DESC
            LIMIT 1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lists users visible under `scope`, applying the query filters.
    pub async fn list(
        &self,
        scope: &RecordScope,
        query: &ListUsersQuery,
    ) -> Result<Vec<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_users");
        let binds = ScopeBinds::new(scope, |s| matches!(s, RecordScope::Own(_)));
        let search = query.search.as_deref().map(contains_pattern);

        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, username, email, password_hash, name, role, department, study_year,
                   reg_no, staff_id, designation, experience, avatar, mentor_id, is_active,
                   created_at, updated_at
            FROM users
            WHERE NOT $1
              AND ($2::uuid IS NULL OR id = $2)
              AND ($3::user_role IS NULL OR role = $3)
              AND ($4::text IS NULL OR department = $4)
              AND ($5::text IS NULL OR study_year = $5)
              AND ($6::uuid IS NULL OR mentor_id = $6)
              AND ($7::text IS NULL
                   OR username ILIKE $7 OR name ILIKE $7 OR email ILIKE $7 OR reg_no ILIKE $7)
            ORDER BY username
            "#,
        )
        .bind(binds.deny)
        .bind(binds.own)
        .bind(query.role)
        .bind(&query.department)
        .bind(&query.study_year)
        .bind(query.mentor)
        .bind(search)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Applies a partial update. Returns `None` if the user does not exist.
    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateUserRequest,
        password_hash: Option<&str>,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                name = COALESCE($4, name),
                role = COALESCE($5, role),
                department = COALESCE($6, department),
                study_year = COALESCE($7, study_year),
                reg_no = COALESCE($8, reg_no),
                staff_id = COALESCE($9, staff_id),
                designation = COALESCE($10, designation),
                experience = COALESCE($11, experience),
                avatar = COALESCE($12, avatar),
                mentor_id = COALESCE($13, mentor_id),
                is_active = COALESCE($14, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, email, password_hash, name, role, department, study_year,
                      reg_no, staff_id, designation, experience, avatar, mentor_id, is_active,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&req.email)
        .bind(password_hash)
        .bind(&req.name)
        .bind(req.role)
        .bind(&req.department)
        .bind(&req.study_year)
        .bind(&req.reg_no)
        .bind(&req.staff_id)
        .bind(&req.designation)
        .bind(&req.experience)
        .bind(&req.avatar)
        .bind(req.mentor)
        .bind(req.is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes a user. Returns the number of rows removed.
    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_user");
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }

    /// Deletes every listed user in one statement. Unknown ids are ignored.
    pub async fn bulk_delete(&self, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("bulk_delete_users");
        let result = sqlx::query("DELETE FROM users WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }

    /// Sets `mentor` on every listed user in one statement.
    ///
    /// Unknown ids and the mentor's own id are skipped. Re-assigning the same
    /// mentor leaves a single link.
    pub async fn assign_mentor(
        &self,
        mentor_id: Uuid,
        student_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("assign_mentor");
        let result = sqlx::query(
            r#"
            UPDATE users
            SET mentor_id = $1, updated_at = NOW()
            WHERE id = ANY($2) AND id <> $1
            "#,
        )
        .bind(mentor_id)
        .bind(student_ids)
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected());
        timer.record();
        result
    }

    /// Counts users holding a role.
    pub async fn count_by_role(&self, role: UserRole) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_users_by_role");
        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }
}
