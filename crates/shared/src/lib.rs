//! Shared utilities for the academic registry backend.
//!
//! This crate provides functionality used across the other crates:
//! - Access/refresh token issuance and verification (RS256 JWT)
//! - Password hashing with Argon2id
//! - Hashing and identifier helpers
//! - Reusable field validators

pub mod crypto;
pub mod jwt;
pub mod password;
pub mod validation;
