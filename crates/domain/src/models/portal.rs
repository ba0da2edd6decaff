//! External portal connections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "portal_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PortalStatus {
    Connected,
    Disconnected,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "portal_permission", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortalPermission {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConnection {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub handshake_id: String,
    pub status: PortalStatus,
    pub permission: PortalPermission,
    pub last_sync: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePortalRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(url(message = "URL must be valid"))]
    pub url: String,

    /// Generated when absent.
    #[validate(length(min = 1, max = 100))]
    pub handshake_id: Option<String>,

    #[serde(default = "default_status")]
    pub status: PortalStatus,

    #[serde(default = "default_permission")]
    pub permission: PortalPermission,
}

fn default_status() -> PortalStatus {
    PortalStatus::Pending
}

fn default_permission() -> PortalPermission {
    PortalPermission::ReadOnly
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePortalRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(url)]
    pub url: Option<String>,
    pub status: Option<PortalStatus>,
    pub permission: Option<PortalPermission>,
    pub last_sync: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portal_defaults() {
        let req: CreatePortalRequest = serde_json::from_value(serde_json::json!({
            "name": "University ERP",
            "url": "https://erp.example.edu"
        }))
        .unwrap();
        assert_eq!(req.status, PortalStatus::Pending);
        assert_eq!(req.permission, PortalPermission::ReadOnly);
        assert!(req.handshake_id.is_none());
        assert!(req.validate().is_ok());
        assert_eq!(
            serde_json::to_string(&PortalPermission::ReadWrite).unwrap(),
            "\"READ_WRITE\""
        );
    }

    #[test]
    fn test_portal_url_checked() {
        let req: CreatePortalRequest = serde_json::from_value(serde_json::json!({
            "name": "ERP",
            "url": "not a url"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }
}
