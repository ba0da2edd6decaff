//! Site settings repository. The table holds at most one row.

use domain::models::settings::{CreateSettingsRequest, UpdateSettingsRequest};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::SettingsEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the settings row, if one has been created.
    pub async fn get(&self) -> Result<Option<SettingsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("get_settings");
        let result = sqlx::query_as::<_, SettingsEntity>(
            r#"
            SELECT id, name, description, admin_email, theme_color, institution
            FROM site_settings
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<SettingsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_settings_by_id");
        let result = sqlx::query_as::<_, SettingsEntity>(
            r#"
            SELECT id, name, description, admin_email, theme_color, institution
            FROM site_settings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Inserts the settings row. A second insert violates the singleton index.
    pub async fn create(&self, req: &CreateSettingsRequest) -> Result<SettingsEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_settings");
        let result = sqlx::query_as::<_, SettingsEntity>(
            r#"
            INSERT INTO site_settings (name, description, admin_email, theme_color, institution)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, admin_email, theme_color, institution
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.admin_email)
        .bind(&req.theme_color)
        .bind(&req.institution)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateSettingsRequest,
    ) -> Result<Option<SettingsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_settings");
        let result = sqlx::query_as::<_, SettingsEntity>(
            r#"
            UPDATE site_settings SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                admin_email = COALESCE($4, admin_email),
                theme_color = COALESCE($5, theme_color),
                institution = COALESCE($6, institution)
            WHERE id = $1
            RETURNING id, name, description, admin_email, theme_color, institution
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.admin_email)
        .bind(&req.theme_color)
        .bind(&req.institution)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_settings");
        let result = sqlx::query("DELETE FROM site_settings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }
}
