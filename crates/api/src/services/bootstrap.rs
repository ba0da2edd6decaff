//! Initial administrator account.
//!
//! Runs once after migrations. When no ADMIN exists and the `bootstrap`
//! section is fully configured, an administrator is created from it.

use domain::models::user::CreateUserRequest;
use domain::models::UserRole;
use persistence::repositories::UserRepository;
use shared::password::{hash_password, PasswordError};
use sqlx::PgPool;
use tracing::{info, warn};
use validator::Validate;

use crate::config::BootstrapConfig;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),

    #[error("Invalid bootstrap account: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Builds the account payload, or `None` when the section is incomplete.
fn bootstrap_request(config: &BootstrapConfig) -> Option<CreateUserRequest> {
    let username = config.username.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    let email = config.email.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    let password = config.password.as_deref().filter(|s| !s.is_empty())?;

    Some(CreateUserRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        name: "System Administrator".to_string(),
        role: UserRole::Admin,
        department: None,
        study_year: None,
        reg_no: None,
        staff_id: None,
        designation: None,
        experience: None,
        avatar: None,
        mentor: None,
    })
}

/// Creates the configured administrator if no ADMIN account exists yet.
///
/// Returns whether an account was created.
pub async fn bootstrap_admin(
    pool: &PgPool,
    config: &BootstrapConfig,
) -> Result<bool, BootstrapError> {
    let Some(request) = bootstrap_request(config) else {
        if config.username.is_some() || config.email.is_some() || config.password.is_some() {
            warn!("Bootstrap section is incomplete; username, email and password are all required");
        }
        return Ok(false);
    };

    let users = UserRepository::new(pool.clone());
    if users.count_by_role(UserRole::Admin).await? > 0 {
        info!("Administrator already exists, skipping bootstrap");
        return Ok(false);
    }

    request.validate()?;
    let password_hash = hash_password(&request.password)?;
    let admin = users.create(&request, &password_hash).await?;

    info!(user_id = %admin.id, username = %admin.username, "Bootstrap administrator created");
    warn!("SECURITY: remove AR__BOOTSTRAP__PASSWORD from the environment after first start");
    Ok(true)
}
