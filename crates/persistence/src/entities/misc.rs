//! Portal, notification, curriculum request and settings entities.

use chrono::{DateTime, Utc};
use domain::models::{ApprovalStatus, PortalPermission, PortalStatus};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct PortalEntity {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub handshake_id: String,
    pub status: PortalStatus,
    pub permission: PortalPermission,
    pub last_sync: Option<DateTime<Utc>>,
}

impl From<PortalEntity> for domain::models::PortalConnection {
    fn from(entity: PortalEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            url: entity.url,
            handshake_id: entity.handshake_id,
            status: entity.status,
            permission: entity.permission,
            last_sync: entity.last_sync,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct NotificationEntity {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub message: String,
    pub notification_type: String,
    pub read: bool,
    pub timestamp: DateTime<Utc>,
}

impl From<NotificationEntity> for domain::models::Notification {
    fn from(entity: NotificationEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            message: entity.message,
            notification_type: entity.notification_type,
            read: entity.read,
            timestamp: entity.timestamp,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CurriculumRequestEntity {
    pub id: Uuid,
    pub hod_id: Uuid,
    pub batch_id: Uuid,
    pub course_id: Uuid,
    pub dept_name: String,
    pub batch_name: String,
    pub reason: String,
    pub status: ApprovalStatus,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

impl From<CurriculumRequestEntity> for domain::models::CurriculumEditRequest {
    fn from(entity: CurriculumRequestEntity) -> Self {
        Self {
            id: entity.id,
            hod_id: entity.hod_id,
            batch_id: entity.batch_id,
            course_id: entity.course_id,
            dept_name: entity.dept_name,
            batch_name: entity.batch_name,
            reason: entity.reason,
            status: entity.status,
            decided_by: entity.decided_by,
            decided_at: entity.decided_at,
            timestamp: entity.timestamp,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SettingsEntity {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub admin_email: Option<String>,
    pub theme_color: String,
    pub institution: String,
}

impl From<SettingsEntity> for domain::models::SiteSettings {
    fn from(entity: SettingsEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            admin_email: entity.admin_email,
            theme_color: entity.theme_color,
            institution: entity.institution,
        }
    }
}
