//! Application services that sit between handlers and repositories.

pub mod auth;
pub mod bootstrap;

pub use auth::{AuthError, AuthService, Grant, IssuedTokens, TOKEN_SCOPE};
pub use bootstrap::{bootstrap_admin, BootstrapError};
