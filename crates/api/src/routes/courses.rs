//! Degree course routes. Courses are returned with their subjects.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::course::{CreateCourseRequest, UpdateCourseRequest};
use domain::models::{Course, CourseDetail, Subject};
use domain::services::{authorize, Action};
use persistence::repositories::{CourseRepository, SubjectRepository};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// Attaches each subject to its course, keeping course order.
fn with_subjects(courses: Vec<Course>, subjects: Vec<Subject>) -> Vec<CourseDetail> {
    let mut by_course: HashMap<Uuid, Vec<Subject>> = HashMap::new();
    for subject in subjects {
        by_course.entry(subject.course_id).or_default().push(subject);
    }
    courses
        .into_iter()
        .map(|course| CourseDetail {
            subjects: by_course.remove(&course.id).unwrap_or_default(),
            course,
        })
        .collect()
}

async fn load_detail(state: &AppState, course: Course) -> Result<CourseDetail, ApiError> {
    let subjects = SubjectRepository::new(state.pool.clone())
        .list_for_courses(&[course.id])
        .await?
        .into_iter()
        .map(Subject::from)
        .collect();
    Ok(CourseDetail { course, subjects })
}

/// GET /api/v1/courses
pub async fn list_courses(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> Result<Json<Vec<CourseDetail>>, ApiError> {
    let courses: Vec<Course> = CourseRepository::new(state.pool.clone())
        .list()
        .await?
        .into_iter()
        .map(Course::from)
        .collect();
    let ids: Vec<Uuid> = courses.iter().map(|c| c.id).collect();
    let subjects = SubjectRepository::new(state.pool.clone())
        .list_for_courses(&ids)
        .await?
        .into_iter()
        .map(Subject::from)
        .collect();

    Ok(Json(with_subjects(courses, subjects)))
}

/// GET /api/v1/courses/:id
pub async fn get_course(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CourseDetail>, ApiError> {
    let course = CourseRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".into()))?;

    Ok(Json(load_detail(&state, course.into()).await?))
}

/// POST /api/v1/courses
pub async fn create_course(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseDetail>), ApiError> {
    authorize(&current.caller, Action::ManageCatalog)?;
    request.validate()?;

    let course = CourseRepository::new(state.pool.clone())
        .create(&request)
        .await?;

    info!(course_id = %course.id, name = %course.name, "Course created");
    Ok((
        StatusCode::CREATED,
        Json(CourseDetail {
            course: course.into(),
            subjects: Vec::new(),
        }),
    ))
}

/// PUT /api/v1/courses/:id
pub async fn update_course(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCourseRequest>,
) -> Result<Json<CourseDetail>, ApiError> {
    authorize(&current.caller, Action::ManageCatalog)?;
    request.validate()?;

    let course = CourseRepository::new(state.pool.clone())
        .update(id, &request)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".into()))?;

    info!(course_id = %id, "Course updated");
    Ok(Json(load_detail(&state, course.into()).await?))
}

/// DELETE /api/v1/courses/:id
///
/// Subjects of the course are removed with it.
pub async fn delete_course(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&current.caller, Action::ManageCatalog)?;

    if CourseRepository::new(state.pool.clone()).delete(id).await? == 0 {
        return Err(ApiError::NotFound("Course not found".into()));
    }

    info!(course_id = %id, "Course deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::BatchType;

    fn course(name: &str) -> Course {
        Course {
            id: Uuid::new_v4(),
            name: name.into(),
            degree: "B.E.".into(),
            domain: "Engineering".into(),
            batch_type: BatchType::Ug,
        }
    }

    fn subject(course_id: Uuid, code: &str) -> Subject {
        Subject {
            id: Uuid::new_v4(),
            course_id,
            code: code.into(),
            name: code.into(),
            credits: 3,
            semester: 1,
            lessons_count: 5,
            materials: vec![],
            lesson_names: vec![],
            assigned_staff: vec![],
        }
    }

    #[test]
    fn test_with_subjects_groups_by_course() {
        let cse = course("CSE");
        let ece = course("ECE");
        let empty = course("MECH");
        let subjects = vec![
            subject(cse.id, "CS101"),
            subject(ece.id, "EC101"),
            subject(cse.id, "CS102"),
        ];

        let details = with_subjects(vec![cse.clone(), ece, empty], subjects);
        assert_eq!(details.len(), 3);
        assert_eq!(details[0].course.id, cse.id);
        let codes: Vec<_> = details[0].subjects.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, ["CS101", "CS102"]);
        assert_eq!(details[1].subjects.len(), 1);
        assert!(details[2].subjects.is_empty());
    }
}
