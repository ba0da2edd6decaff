//! Domain layer for the academic registry backend.
//!
//! This crate contains:
//! - Record models and request/response payloads
//! - Pure services: academic aggregation, workflow state machines, access policy
//! - Domain error types

pub mod errors;
pub mod models;
pub mod services;
