//! Subject routes, including the material list upload.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::subject::{
    CreateSubjectRequest, ListSubjectsQuery, UpdateMaterialsRequest, UpdateSubjectRequest,
};
use domain::models::Subject;
use domain::services::{authorize, Action};
use persistence::repositories::SubjectRepository;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

fn check_material_count(state: &AppState, materials: Option<&[String]>) -> Result<(), ApiError> {
    let max = state.config.limits.max_materials;
    match materials {
        Some(list) if list.len() > max => Err(ApiError::Validation(format!(
            "A subject can hold at most {} materials",
            max
        ))),
        _ => Ok(()),
    }
}

/// GET /api/v1/subjects
pub async fn list_subjects(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(query): Query<ListSubjectsQuery>,
) -> Result<Json<Vec<Subject>>, ApiError> {
    let subjects = SubjectRepository::new(state.pool.clone())
        .list(&query)
        .await?;
    Ok(Json(subjects.into_iter().map(Subject::from).collect()))
}

/// GET /api/v1/subjects/:id
pub async fn get_subject(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Subject>, ApiError> {
    let subject = SubjectRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subject not found".into()))?;
    Ok(Json(subject.into()))
}

/// POST /api/v1/subjects
pub async fn create_subject(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateSubjectRequest>,
) -> Result<(StatusCode, Json<Subject>), ApiError> {
    authorize(&current.caller, Action::ManageCatalog)?;
    request.validate()?;
    check_material_count(&state, Some(&request.materials))?;

    let subject = SubjectRepository::new(state.pool.clone())
        .create(&request, current.caller.role)
        .await?;

    info!(
        subject_id = %subject.id,
        code = %subject.code,
        course_id = %subject.course_id,
        "Subject created"
    );
    Ok((StatusCode::CREATED, Json(subject.into())))
}

/// PUT /api/v1/subjects/:id
pub async fn update_subject(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSubjectRequest>,
) -> Result<Json<Subject>, ApiError> {
    authorize(&current.caller, Action::ManageCatalog)?;
    request.validate()?;
    check_material_count(&state, request.materials.as_deref())?;

    let subject = SubjectRepository::new(state.pool.clone())
        .update(id, &request, current.caller.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subject not found".into()))?;

    info!(subject_id = %id, "Subject updated");
    Ok(Json(subject.into()))
}

/// DELETE /api/v1/subjects/:id
pub async fn delete_subject(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&current.caller, Action::ManageCatalog)?;

    let deleted = SubjectRepository::new(state.pool.clone())
        .delete(id, current.caller.role)
        .await?;
    if !deleted {
        return Err(ApiError::NotFound("Subject not found".into()));
    }

    info!(subject_id = %id, "Subject deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the material filenames of a subject.
///
/// POST /api/v1/subjects/:id/update_materials
pub async fn update_materials(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMaterialsRequest>,
) -> Result<Json<Subject>, ApiError> {
    authorize(&current.caller, Action::UpdateMaterials)?;
    request.validate()?;
    check_material_count(&state, Some(&request.materials))?;

    let subject = SubjectRepository::new(state.pool.clone())
        .update_materials(id, &request.materials)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subject not found".into()))?;

    info!(
        subject_id = %id,
        material_count = request.materials.len(),
        updated_by = %current.id(),
        "Subject materials updated"
    );
    Ok(Json(subject.into()))
}
