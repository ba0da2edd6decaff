use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::errors::{AccessDenied, WorkflowError};
use domain::models::attendance::FieldError;
use domain::services::AggregationError;
use persistence::RepositoryError;
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input")]
    InvalidInput(Vec<FieldError>),

    /// A workflow guard rejected the operation.
    #[error("State conflict: {0}")]
    StateConflict(String),

    #[error("Already decided: {0}")]
    AlreadyDecided(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut details = None;
        let (status, error_code, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::InvalidInput(fields) => {
                let message = match fields.as_slice() {
                    [single] => single.message.clone(),
                    many => format!("{} validation errors", many.len()),
                };
                details = Some(fields);
                (StatusCode::BAD_REQUEST, "validation_error", message)
            }
            ApiError::StateConflict(msg) => (StatusCode::CONFLICT, "state_conflict", msg),
            ApiError::AlreadyDecided(msg) => (StatusCode::CONFLICT, "already_decided", msg),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => ApiError::Conflict("Resource already exists".into()),
                Some("23503") => ApiError::NotFound("Referenced resource not found".into()),
                Some("23514") => {
                    ApiError::Validation("Value violates a data constraint".into())
                }
                _ => ApiError::Internal(format!("Database error: {}", db_err)),
            },
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        tracing::warn!(reason = %err, "Workflow transition rejected");
        match err {
            WorkflowError::AlreadyDecided { .. } => ApiError::AlreadyDecided(err.to_string()),
            WorkflowError::BatchClosed { .. }
            | WorkflowError::InvalidTransition { .. }
            | WorkflowError::AlreadyEditable
            | WorkflowError::CurriculumFrozen
            | WorkflowError::AttendanceLocked { .. } => ApiError::StateConflict(err.to_string()),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => e.into(),
            RepositoryError::Workflow(e) => e.into(),
            RepositoryError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
        }
    }
}

impl From<AccessDenied> for ApiError {
    fn from(err: AccessDenied) -> Self {
        ApiError::Forbidden(err.0.to_string())
    }
}

impl From<AggregationError<sqlx::Error>> for ApiError {
    fn from(err: AggregationError<sqlx::Error>) -> Self {
        match err {
            AggregationError::UserNotFound => ApiError::NotFound("User not found".into()),
            AggregationError::NotAStudent => ApiError::Validation(err.to_string()),
            AggregationError::Source(e) => e.into(),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::InvalidInput(field_errors(&errors))
    }
}

/// Flattens validator output into `{field, message}` pairs, ordered by field.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut details: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| FieldError {
                field: if *field == "__all__" {
                    "non_field_errors".to_string()
                } else {
                    field.to_string()
                },
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect();
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{ApprovalStatus, MarkBatchStatus};
    use validator::Validate;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::InvalidInput(vec![]), StatusCode::BAD_REQUEST),
            (ApiError::StateConflict("x".into()), StatusCode::CONFLICT),
            (ApiError::AlreadyDecided("x".into()), StatusCode::CONFLICT),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_internal_message_hidden() {
        let body = body_json(ApiError::Internal("password=hunter2".into()).into_response()).await;
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_workflow_errors_map_to_conflict_codes() {
        let closed: ApiError = WorkflowError::BatchClosed {
            status: MarkBatchStatus::Frozen,
        }
        .into();
        let body = body_json(closed.into_response()).await;
        assert_eq!(body["error"], "state_conflict");

        let decided: ApiError = WorkflowError::AlreadyDecided {
            status: ApprovalStatus::Approved,
        }
        .into();
        let response = decided.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["error"], "already_decided");
    }

    #[test]
    fn test_repository_errors() {
        let err: ApiError = RepositoryError::NotFound("Leave request").into();
        assert!(matches!(err, ApiError::NotFound(m) if m == "Leave request not found"));

        let err: ApiError = RepositoryError::Database(sqlx::Error::RowNotFound).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_access_denied_is_forbidden() {
        let err: ApiError = AccessDenied("nope").into();
        assert!(matches!(err, ApiError::Forbidden(m) if m == "nope"));
    }

    #[test]
    fn test_aggregation_errors() {
        let err: ApiError = AggregationError::<sqlx::Error>::NotAStudent.into();
        assert!(matches!(err, ApiError::Validation(_)));
        let err: ApiError = AggregationError::<sqlx::Error>::UserNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[derive(Validate)]
    struct HourEntry {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(range(min = 1, max = 8))]
        hour: i32,
    }

    #[tokio::test]
    async fn test_validation_details() {
        let errors = HourEntry {
            name: String::new(),
            hour: 9,
        }
        .validate()
        .unwrap_err();

        let fields = field_errors(&errors);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "hour");
        assert_eq!(fields[0].message, "range");
        assert_eq!(fields[1].message, "Name is required");

        let body = body_json(ApiError::from(errors).into_response()).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
    }
}
