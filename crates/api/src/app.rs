use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, security_headers_middleware, trace_id, HstsEnabled,
};
use crate::routes::{
    attendance, attendance_requests, auth, batches, courses, curriculum_requests, health, leaves,
    marks, notifications, portals, settings, subjects, tasks, timetables, users,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        // Development default
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Resource routes under `/api/v1`. Authentication is enforced per handler
/// by the `CurrentUser` extractor, so the few public reads live here too.
fn api_routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/auth/token", post(auth::token))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/me", get(users::me))
        .route("/users/assign_students", post(users::assign_students))
        .route("/users/bulk_delete", post(users::bulk_delete))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/:id/academic_data", get(users::academic_data))
        // Catalog
        .route(
            "/courses",
            get(courses::list_courses).post(courses::create_course),
        )
        .route(
            "/courses/:id",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route(
            "/subjects",
            get(subjects::list_subjects).post(subjects::create_subject),
        )
        .route(
            "/subjects/:id",
            get(subjects::get_subject)
                .put(subjects::update_subject)
                .delete(subjects::delete_subject),
        )
        .route(
            "/subjects/:id/update_materials",
            post(subjects::update_materials),
        )
        .route(
            "/batches",
            get(batches::list_batches).post(batches::create_batch),
        )
        .route(
            "/batches/:id",
            get(batches::get_batch)
                .put(batches::update_batch)
                .delete(batches::delete_batch),
        )
        .route(
            "/curriculum-status",
            get(batches::list_curricula).post(batches::create_curriculum),
        )
        .route(
            "/curriculum-status/:id",
            get(batches::get_curriculum)
                .put(batches::update_curriculum)
                .delete(batches::delete_curriculum),
        )
        // Tasks
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/:id",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        // Attendance
        .route(
            "/attendance",
            get(attendance::list_attendance).post(attendance::create_attendance),
        )
        .route("/attendance/bulk_create", post(attendance::bulk_create))
        .route(
            "/attendance/:id",
            get(attendance::get_attendance)
                .put(attendance::update_attendance)
                .delete(attendance::delete_attendance),
        )
        .route(
            "/attendance-requests",
            get(attendance_requests::list_requests).post(attendance_requests::create_request),
        )
        .route(
            "/attendance-requests/:id",
            get(attendance_requests::get_request)
                .put(attendance_requests::update_request)
                .delete(attendance_requests::delete_request),
        )
        .route(
            "/attendance-requests/:id/approve",
            post(attendance_requests::approve_request),
        )
        .route(
            "/attendance-requests/:id/reject",
            post(attendance_requests::reject_request),
        )
        // Marks
        .route(
            "/mark-batches",
            get(marks::list_batches).post(marks::create_batch),
        )
        .route(
            "/mark-batches/:id",
            get(marks::get_batch)
                .put(marks::update_batch)
                .delete(marks::delete_batch),
        )
        .route(
            "/mark-records",
            get(marks::list_records).post(marks::create_record),
        )
        .route(
            "/mark-records/:id",
            get(marks::get_record)
                .put(marks::update_record)
                .delete(marks::delete_record),
        )
        // Leaves
        .route("/leaves", get(leaves::list_leaves).post(leaves::create_leave))
        .route(
            "/leaves/:id",
            get(leaves::get_leave)
                .put(leaves::update_leave)
                .delete(leaves::delete_leave),
        )
        .route("/leaves/:id/approve", post(leaves::approve_leave))
        .route("/leaves/:id/reject", post(leaves::reject_leave))
        // Timetables
        .route(
            "/timetables",
            get(timetables::list_timetables).post(timetables::create_timetable),
        )
        .route(
            "/timetables/:id",
            get(timetables::get_timetable)
                .put(timetables::update_timetable)
                .delete(timetables::delete_timetable),
        )
        // Portals
        .route(
            "/portals",
            get(portals::list_portals).post(portals::create_portal),
        )
        .route(
            "/portals/:id",
            get(portals::get_portal)
                .put(portals::update_portal)
                .delete(portals::delete_portal),
        )
        // Notifications
        .route(
            "/notifications",
            get(notifications::list_notifications).post(notifications::create_notification),
        )
        .route("/notifications/clear_all", post(notifications::clear_all))
        .route(
            "/notifications/:id",
            get(notifications::get_notification)
                .put(notifications::update_notification)
                .delete(notifications::delete_notification),
        )
        .route("/notifications/:id/read", post(notifications::mark_read))
        // Curriculum edit requests
        .route(
            "/curriculum-requests",
            get(curriculum_requests::list_requests).post(curriculum_requests::create_request),
        )
        .route(
            "/curriculum-requests/:id",
            get(curriculum_requests::get_request)
                .put(curriculum_requests::update_request)
                .delete(curriculum_requests::delete_request),
        )
        .route(
            "/curriculum-requests/:id/approve",
            post(curriculum_requests::approve_request),
        )
        .route(
            "/curriculum-requests/:id/reject",
            post(curriculum_requests::reject_request),
        )
        // Settings (reads are public)
        .route(
            "/settings",
            get(settings::get_settings).post(settings::create_settings),
        )
        .route(
            "/settings/:id",
            get(settings::get_settings_by_id)
                .put(settings::update_settings)
                .delete(settings::delete_settings),
        )
}

/// Builds the application router. Fails when the configured JWT keys do not
/// parse.
pub fn create_app(config: Config, pool: PgPool) -> Result<Router, JwtError> {
    let jwt = JwtConfig::with_leeway(
        &config.jwt.private_key,
        &config.jwt.public_key,
        config.jwt.access_token_expiry_secs,
        config.jwt.refresh_token_expiry_secs,
        config.jwt.leeway_secs,
    )?;
    Ok(create_app_with_jwt(config, pool, jwt))
}

/// Same as [`create_app`] with an already built signing config.
pub fn create_app_with_jwt(config: Config, pool: PgPool, jwt: JwtConfig) -> Router {
    let config = Arc::new(config);
    let state = AppState {
        pool,
        config: config.clone(),
        jwt: Arc::new(jwt),
    };

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes())
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(middleware::from_fn_with_state(
            HstsEnabled(config.security.hsts_enabled),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config))
        .with_state(state)
}
