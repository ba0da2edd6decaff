//! Installation-wide site settings (a single row).

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_SITE_NAME: &str = "GAPT";
pub const DEFAULT_THEME_COLOR: &str = "#5d58ff";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSettings {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub admin_email: Option<String>,
    pub theme_color: String,
    pub institution: String,
}

/// Body of the settings list endpoint: the singleton or `{}`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SettingsDocument {
    Present(SiteSettings),
    Empty {},
}

impl From<Option<SiteSettings>> for SettingsDocument {
    fn from(settings: Option<SiteSettings>) -> Self {
        settings.map_or(SettingsDocument::Empty {}, SettingsDocument::Present)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSettingsRequest {
    #[serde(default = "default_name")]
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,

    #[validate(email(message = "Invalid email format"))]
    pub admin_email: Option<String>,

    #[serde(default = "default_theme")]
    #[validate(custom(function = "shared::validation::validate_hex_color"))]
    pub theme_color: String,

    #[serde(default)]
    #[validate(length(max = 255))]
    pub institution: String,
}

fn default_name() -> String {
    DEFAULT_SITE_NAME.to_string()
}

fn default_theme() -> String {
    DEFAULT_THEME_COLOR.to_string()
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(email)]
    pub admin_email: Option<String>,
    #[validate(custom(function = "shared::validation::validate_hex_color"))]
    pub theme_color: Option<String>,
    #[validate(length(max = 255))]
    pub institution: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_empty_object() {
        let json = serde_json::to_value(SettingsDocument::from(None)).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_present_document_is_flat() {
        let doc = SettingsDocument::from(Some(SiteSettings {
            id: Uuid::nil(),
            name: DEFAULT_SITE_NAME.into(),
            description: String::new(),
            admin_email: None,
            theme_color: DEFAULT_THEME_COLOR.into(),
            institution: "Example College".into(),
        }));
        let json = serde_json::to_value(doc).unwrap();
        assert_eq!(json["theme_color"], "#5d58ff");
        assert_eq!(json["institution"], "Example College");
    }

    #[test]
    fn test_create_defaults_and_color_check() {
        let req: CreateSettingsRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(req.name, "GAPT");
        assert_eq!(req.theme_color, "#5d58ff");
        assert!(req.validate().is_ok());

        let bad = CreateSettingsRequest {
            theme_color: "purple".into(),
            ..req
        };
        assert!(bad.validate().is_err());
    }
}
