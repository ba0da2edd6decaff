//! External portal connections. Administrator-only, reads included.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::portal::{CreatePortalRequest, UpdatePortalRequest};
use domain::models::PortalConnection;
use domain::services::{authorize, Action};
use persistence::repositories::PortalRepository;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// GET /api/v1/portals
pub async fn list_portals(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<PortalConnection>>, ApiError> {
    authorize(&current.caller, Action::AccessPortals)?;
    let portals = PortalRepository::new(state.pool.clone()).list().await?;
    Ok(Json(portals.into_iter().map(PortalConnection::from).collect()))
}

/// GET /api/v1/portals/:id
pub async fn get_portal(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PortalConnection>, ApiError> {
    authorize(&current.caller, Action::AccessPortals)?;
    let portal = PortalRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Portal not found".into()))?;
    Ok(Json(portal.into()))
}

/// POST /api/v1/portals
pub async fn create_portal(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreatePortalRequest>,
) -> Result<(StatusCode, Json<PortalConnection>), ApiError> {
    authorize(&current.caller, Action::AccessPortals)?;
    request.validate()?;

    let portal = PortalRepository::new(state.pool.clone())
        .create(&request)
        .await?;

    info!(
        portal_id = %portal.id,
        name = %portal.name,
        status = ?portal.status,
        "Portal registered"
    );
    Ok((StatusCode::CREATED, Json(portal.into())))
}

/// PUT /api/v1/portals/:id
pub async fn update_portal(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePortalRequest>,
) -> Result<Json<PortalConnection>, ApiError> {
    authorize(&current.caller, Action::AccessPortals)?;
    request.validate()?;

    let portal = PortalRepository::new(state.pool.clone())
        .update(id, &request)
        .await?
        .ok_or_else(|| ApiError::NotFound("Portal not found".into()))?;

    info!(portal_id = %id, status = ?portal.status, "Portal updated");
    Ok(Json(portal.into()))
}

/// DELETE /api/v1/portals/:id
pub async fn delete_portal(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&current.caller, Action::AccessPortals)?;

    if PortalRepository::new(state.pool.clone()).delete(id).await? == 0 {
        return Err(ApiError::NotFound("Portal not found".into()));
    }

    info!(portal_id = %id, "Portal removed");
    Ok(StatusCode::NO_CONTENT)
}
