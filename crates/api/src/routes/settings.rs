//! Site settings. Reads are public so the front-end can theme its login page.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::settings::{CreateSettingsRequest, SettingsDocument, UpdateSettingsRequest};
use domain::models::SiteSettings;
use domain::services::{authorize, Action};
use persistence::repositories::SettingsRepository;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// The settings row, or `{}` before one has been created.
///
/// GET /api/v1/settings
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<SettingsDocument>, ApiError> {
    let settings = SettingsRepository::new(state.pool.clone()).get().await?;
    Ok(Json(settings.map(SiteSettings::from).into()))
}

/// GET /api/v1/settings/:id
pub async fn get_settings_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SiteSettings>, ApiError> {
    let settings = SettingsRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Settings not found".into()))?;
    Ok(Json(settings.into()))
}

/// POST /api/v1/settings
pub async fn create_settings(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateSettingsRequest>,
) -> Result<(StatusCode, Json<SiteSettings>), ApiError> {
    authorize(&current.caller, Action::ManageSettings)?;
    request.validate()?;

    let repo = SettingsRepository::new(state.pool.clone());
    if repo.get().await?.is_some() {
        return Err(ApiError::Conflict("Site settings already exist".into()));
    }
    let settings = repo.create(&request).await?;

    info!(settings_id = %settings.id, name = %settings.name, "Site settings created");
    Ok((StatusCode::CREATED, Json(settings.into())))
}

/// PUT /api/v1/settings/:id
pub async fn update_settings(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<SiteSettings>, ApiError> {
    authorize(&current.caller, Action::ManageSettings)?;
    request.validate()?;

    let settings = SettingsRepository::new(state.pool.clone())
        .update(id, &request)
        .await?
        .ok_or_else(|| ApiError::NotFound("Settings not found".into()))?;

    info!(settings_id = %id, updated_by = %current.id(), "Site settings updated");
    Ok(Json(settings.into()))
}

/// DELETE /api/v1/settings/:id
pub async fn delete_settings(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&current.caller, Action::ManageSettings)?;

    if SettingsRepository::new(state.pool.clone()).delete(id).await? == 0 {
        return Err(ApiError::NotFound("Settings not found".into()));
    }

    info!(settings_id = %id, "Site settings deleted");
    Ok(StatusCode::NO_CONTENT)
}
