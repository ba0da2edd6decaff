//! Academic task routes.
//!
//! Reads are scoped: students see their cohort's tasks, teaching staff see
//! tasks they authored, leadership sees everything.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::task::{CreateTaskRequest, ListTasksQuery, UpdateTaskRequest};
use domain::models::AcademicTask;
use domain::services::{authorize, scope, Action, Resource};
use persistence::entities::TaskEntity;
use persistence::repositories::TaskRepository;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

async fn find_visible(
    repo: &TaskRepository,
    current: &CurrentUser,
    id: Uuid,
) -> Result<TaskEntity, ApiError> {
    repo.find_by_id(id, &scope(&current.caller, Resource::Tasks))
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".into()))
}

/// GET /api/v1/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<AcademicTask>>, ApiError> {
    let tasks = TaskRepository::new(state.pool.clone())
        .list(&scope(&current.caller, Resource::Tasks), &query)
        .await?;
    Ok(Json(tasks.into_iter().map(AcademicTask::from).collect()))
}

/// GET /api/v1/tasks/:id
pub async fn get_task(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AcademicTask>, ApiError> {
    let repo = TaskRepository::new(state.pool.clone());
    let task = find_visible(&repo, &current, id).await?;
    Ok(Json(task.into()))
}

/// POST /api/v1/tasks
///
/// The caller becomes the task's author.
pub async fn create_task(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<AcademicTask>), ApiError> {
    authorize(&current.caller, Action::CreateTask)?;
    request.validate()?;

    let task = TaskRepository::new(state.pool.clone())
        .create(current.id(), &request)
        .await?;

    info!(
        task_id = %task.id,
        staff_id = %current.id(),
        department = ?task.department,
        study_year = ?task.study_year,
        "Task created"
    );
    Ok((StatusCode::CREATED, Json(task.into())))
}

/// PUT /api/v1/tasks/:id
pub async fn update_task(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTaskRequest>,
) -> Result<Json<AcademicTask>, ApiError> {
    let repo = TaskRepository::new(state.pool.clone());
    let existing = find_visible(&repo, &current, id).await?;
    authorize(
        &current.caller,
        Action::ModifyTask {
            author: existing.staff_id,
        },
    )?;
    request.validate()?;

    let task = repo
        .update(id, &request)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".into()))?;

    info!(task_id = %id, status = ?task.status, "Task updated");
    Ok(Json(task.into()))
}

/// DELETE /api/v1/tasks/:id
pub async fn delete_task(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = TaskRepository::new(state.pool.clone());
    let existing = find_visible(&repo, &current, id).await?;
    authorize(
        &current.caller,
        Action::ModifyTask {
            author: existing.staff_id,
        },
    )?;

    repo.delete(id).await?;

    info!(task_id = %id, deleted_by = %current.id(), "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}
