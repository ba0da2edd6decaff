//! Notification routes.
//!
//! Every caller sees notifications addressed to them plus broadcasts (rows
//! without a recipient).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::notification::{
    ClearNotificationsResponse, CreateNotificationRequest, UpdateNotificationRequest,
};
use domain::models::Notification;
use domain::services::{authorize, Action};
use persistence::entities::NotificationEntity;
use persistence::repositories::NotificationRepository;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

async fn find_visible(
    repo: &NotificationRepository,
    current: &CurrentUser,
    id: Uuid,
) -> Result<NotificationEntity, ApiError> {
    repo.find_visible(id, current.id())
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".into()))
}

/// GET /api/v1/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let rows = NotificationRepository::new(state.pool.clone())
        .list_for(current.id())
        .await?;
    Ok(Json(rows.into_iter().map(Notification::from).collect()))
}

/// GET /api/v1/notifications/:id
pub async fn get_notification(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let repo = NotificationRepository::new(state.pool.clone());
    Ok(Json(find_visible(&repo, &current, id).await?.into()))
}

/// POST /api/v1/notifications
///
/// Omitting `user` publishes a broadcast.
pub async fn create_notification(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    authorize(&current.caller, Action::PublishNotification)?;
    request.validate()?;

    let row = NotificationRepository::new(state.pool.clone())
        .create(&request)
        .await?;

    info!(
        notification_id = %row.id,
        recipient = ?row.user_id,
        notification_type = %row.notification_type,
        "Notification published"
    );
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// PUT /api/v1/notifications/:id
pub async fn update_notification(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateNotificationRequest>,
) -> Result<Json<Notification>, ApiError> {
    let repo = NotificationRepository::new(state.pool.clone());
    let existing = find_visible(&repo, &current, id).await?;
    authorize(
        &current.caller,
        Action::UpdateNotification {
            recipient: existing.user_id,
        },
    )?;
    request.validate()?;

    let row = repo
        .update(id, &request)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".into()))?;

    info!(notification_id = %id, read = row.read, "Notification updated");
    Ok(Json(row.into()))
}

/// POST /api/v1/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let repo = NotificationRepository::new(state.pool.clone());
    let existing = find_visible(&repo, &current, id).await?;
    authorize(
        &current.caller,
        Action::UpdateNotification {
            recipient: existing.user_id,
        },
    )?;

    let request = UpdateNotificationRequest {
        read: Some(true),
        ..Default::default()
    };
    let row = repo
        .update(id, &request)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".into()))?;

    Ok(Json(row.into()))
}

/// DELETE /api/v1/notifications/:id
pub async fn delete_notification(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = NotificationRepository::new(state.pool.clone());
    let existing = find_visible(&repo, &current, id).await?;
    authorize(
        &current.caller,
        Action::DeleteNotification {
            recipient: existing.user_id,
        },
    )?;

    repo.delete(id).await?;

    info!(notification_id = %id, deleted_by = %current.id(), "Notification deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Delete every notification addressed to the caller. Broadcasts are kept.
///
/// POST /api/v1/notifications/clear_all
pub async fn clear_all(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<ClearNotificationsResponse>, ApiError> {
    let deleted = NotificationRepository::new(state.pool.clone())
        .clear_for_user(current.id())
        .await?;

    info!(user_id = %current.id(), deleted, "Notifications cleared");
    Ok(Json(ClearNotificationsResponse {
        status: "cleared",
        deleted,
    }))
}
