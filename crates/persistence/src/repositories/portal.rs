//! External portal connection repository.

use domain::models::portal::{CreatePortalRequest, UpdatePortalRequest};
use shared::crypto::generate_handshake_id;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::PortalEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct PortalRepository {
    pool: PgPool,
}

impl PortalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<PortalEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_portals");
        let result = sqlx::query_as::<_, PortalEntity>(
            r#"
            SELECT id, name, url, handshake_id, status, permission, last_sync
            FROM portal_connections
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<PortalEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_portal_by_id");
        let result = sqlx::query_as::<_, PortalEntity>(
            r#"
            SELECT id, name, url, handshake_id, status, permission, last_sync
            FROM portal_connections
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Registers a portal. A handshake id is generated when none is supplied.
    pub async fn create(&self, req: &CreatePortalRequest) -> Result<PortalEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_portal");
        let handshake_id = req
            .handshake_id
            .clone()
            .unwrap_or_else(generate_handshake_id);
        let result = sqlx::query_as::<_, PortalEntity>(
            r#"
            INSERT INTO portal_connections (name, url, handshake_id, status, permission)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, url, handshake_id, status, permission, last_sync
            "#,
        )
        .bind(&req.name)
        .bind(&req.url)
        .bind(&handshake_id)
        .bind(req.status)
        .bind(req.permission)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdatePortalRequest,
    ) -> Result<Option<PortalEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_portal");
        let result = sqlx::query_as::<_, PortalEntity>(
            r#"
            UPDATE portal_connections SET
                name = COALESCE($2, name),
                url = COALESCE($3, url),
                status = COALESCE($4, status),
                permission = COALESCE($5, permission),
                last_sync = COALESCE($6, last_sync)
            WHERE id = $1
            RETURNING id, name, url, handshake_id, status, permission, last_sync
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.url)
        .bind(req.status)
        .bind(req.permission)
        .bind(req.last_sync)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_portal");
        let result = sqlx::query("DELETE FROM portal_connections WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }
}
