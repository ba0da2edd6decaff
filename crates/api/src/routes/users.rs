//! User account routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::user::{
    AssignStudentsRequest, AssignStudentsResponse, BulkDeleteRequest, BulkDeleteResponse,
    CreateUserRequest, ListUsersQuery, UpdateUserRequest,
};
use domain::models::{AcademicData, User, UserRole};
use domain::services::{authorize, scope, AcademicService, Action, RecordScope, Resource};
use persistence::repositories::{AcademicRecordRepository, UserRepository};
use shared::password::hash_password;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// Students only see their own account; everyone else sees all accounts.
fn ensure_visible(current: &CurrentUser, id: Uuid) -> Result<(), ApiError> {
    match scope(&current.caller, Resource::Users) {
        RecordScope::Own(own) if own != id => Err(ApiError::NotFound("User not found".into())),
        _ => Ok(()),
    }
}

fn hash(password: &str) -> Result<String, ApiError> {
    hash_password(password)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))
}

/// List users.
///
/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let scope = scope(&current.caller, Resource::Users);
    let users = UserRepository::new(state.pool.clone())
        .list(&scope, &query)
        .await?;

    Ok(Json(users.into_iter().map(User::from).collect()))
}

/// Get a user.
///
/// GET /api/v1/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    ensure_visible(&current, id)?;
    let user = UserRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(user.into()))
}

/// The caller's own account.
///
/// GET /api/v1/users/me
pub async fn me(current: CurrentUser) -> Json<User> {
    Json(current.user)
}

/// Create an account.
///
/// POST /api/v1/users
pub async fn create_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    authorize(&current.caller, Action::CreateUser)?;
    request.validate()?;

    let password_hash = hash(&request.password)?;
    let user = UserRepository::new(state.pool.clone())
        .create(&request, &password_hash)
        .await?;

    info!(
        user_id = %user.id,
        role = %user.role,
        created_by = %current.id(),
        "User created"
    );

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Partially update an account.
///
/// PUT /api/v1/users/:id
///
/// Users may edit their own profile; role, activation and mentor are
/// administrator-only.
pub async fn update_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    authorize(
        &current.caller,
        Action::UpdateUser {
            target: id,
            privileged: request.touches_privileged_fields(),
        },
    )?;
    request.validate()?;

    let password_hash = request.password.as_deref().map(hash).transpose()?;
    let user = UserRepository::new(state.pool.clone())
        .update(id, &request, password_hash.as_deref())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    info!(
        user_id = %id,
        updated_by = %current.id(),
        password_changed = password_hash.is_some(),
        "User updated"
    );

    Ok(Json(user.into()))
}

/// Delete an account.
///
/// DELETE /api/v1/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&current.caller, Action::DeleteUsers)?;

    let deleted = UserRepository::new(state.pool.clone()).delete(id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("User not found".into()));
    }

    info!(user_id = %id, deleted_by = %current.id(), "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Set a staff member as mentor of a list of students.
///
/// POST /api/v1/users/assign_students
pub async fn assign_students(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<AssignStudentsRequest>,
) -> Result<Json<AssignStudentsResponse>, ApiError> {
    authorize(&current.caller, Action::AssignMentors)?;

    let max = state.config.limits.max_bulk_items;
    if request.student_ids.len() > max {
        return Err(ApiError::Validation(format!(
            "At most {} students can be assigned at once",
            max
        )));
    }

    let repo = UserRepository::new(state.pool.clone());
    let mentor = repo
        .find_by_id(request.staff_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Staff member not found".into()))?;
    if mentor.role == UserRole::Student {
        return Err(ApiError::Validation(
            "Mentor must be a staff account".into(),
        ));
    }

    let assigned = repo.assign_mentor(mentor.id, &request.student_ids).await?;

    info!(
        mentor_id = %mentor.id,
        requested = request.student_ids.len(),
        assigned,
        "Mentor assigned"
    );

    Ok(Json(AssignStudentsResponse {
        status: "assigned",
        assigned,
    }))
}

/// Delete a list of accounts in one statement.
///
/// POST /api/v1/users/bulk_delete
pub async fn bulk_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, ApiError> {
    authorize(&current.caller, Action::DeleteUsers)?;

    let max = state.config.limits.max_bulk_items;
    if request.ids.len() > max {
        return Err(ApiError::Validation(format!(
            "At most {} users can be deleted at once",
            max
        )));
    }
    if request.ids.contains(&current.id()) {
        return Err(ApiError::Validation(
            "You cannot delete your own account".into(),
        ));
    }

    let deleted = UserRepository::new(state.pool.clone())
        .bulk_delete(&request.ids)
        .await?;

    info!(
        requested = request.ids.len(),
        deleted,
        deleted_by = %current.id(),
        "Users bulk deleted"
    );

    Ok(Json(BulkDeleteResponse {
        status: "deleted",
        deleted,
    }))
}

/// Derived academic standing of a student.
///
/// GET /api/v1/users/:id/academic_data
pub async fn academic_data(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AcademicData>, ApiError> {
    ensure_visible(&current, id)?;

    let service = AcademicService::new(AcademicRecordRepository::new(state.pool.clone()));
    let data = service.academic_data(id).await?;
    Ok(Json(data))
}
