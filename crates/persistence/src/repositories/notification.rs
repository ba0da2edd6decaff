//! Notification repository.

use domain::models::notification::{CreateNotificationRequest, UpdateNotificationRequest};
use domain::models::DecisionNotice;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::entities::NotificationEntity;
use crate::metrics::QueryTimer;

/// Repository for user and broadcast notifications.
///
/// A row with a NULL `user_id` is a broadcast visible to everyone.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists the notifications addressed to a user plus broadcasts, newest first.
    pub async fn list_for(&self, user_id: Uuid) -> Result<Vec<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_notifications");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            SELECT id, user_id, message, notification_type, read, timestamp
            FROM notifications
            WHERE user_id = $1 OR user_id IS NULL
            ORDER BY timestamp DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Finds a notification visible to `user_id`.
    pub async fn find_visible(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_notification_by_id");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            SELECT id, user_id, message, notification_type, read, timestamp
            FROM notifications
            WHERE id = $1 AND (user_id = $2 OR user_id IS NULL)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(
        &self,
        req: &CreateNotificationRequest,
    ) -> Result<NotificationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            INSERT INTO notifications (user_id, message, notification_type)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, message, notification_type, read, timestamp
            "#,
        )
        .bind(req.user)
        .bind(&req.message)
        .bind(&req.notification_type)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Sends a decision notice as part of the deciding transaction.
    pub(crate) async fn notify_in(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        notice: &DecisionNotice<'_>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO notifications (user_id, message, notification_type) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(notice.message())
        .bind(notice.kind())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateNotificationRequest,
    ) -> Result<Option<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            UPDATE notifications SET
                read = COALESCE($2, read),
                message = COALESCE($3, message)
            WHERE id = $1
            RETURNING id, user_id, message, notification_type, read, timestamp
            "#,
        )
        .bind(id)
        .bind(req.read)
        .bind(&req.message)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_notification");
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }

    /// Deletes every notification addressed to the user. Broadcasts stay.
    pub async fn clear_for_user(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("clear_notifications");
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }
}
