//! HTTP route handlers, one module per resource.

pub mod attendance;
pub mod attendance_requests;
pub mod auth;
pub mod batches;
pub mod courses;
pub mod curriculum_requests;
pub mod health;
pub mod leaves;
pub mod marks;
pub mod notifications;
pub mod portals;
pub mod settings;
pub mod subjects;
pub mod tasks;
pub mod timetables;
pub mod users;
