//! OAuth2 token issuance for the registry's confidential client.
//!
//! Two grants are supported:
//! - `password`: username or e-mail plus password
//! - `refresh_token`: a previously issued refresh token
//!
//! Refresh tokens are stateless; a disabled or deleted account cannot refresh
//! because the account is reloaded on every grant.

use persistence::entities::UserEntity;
use persistence::repositories::UserRepository;
use shared::crypto::verify_client_secret;
use shared::jwt::{JwtConfig, JwtError, TokenPair};
use shared::password::{verify_password, PasswordError};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::OAuthClientConfig;

/// Scope reported with every token; the registry has a single scope.
pub const TOKEN_SCOPE: &str = "read write";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Client authentication failed")]
    InvalidClient,

    #[error("Invalid credentials given")]
    InvalidGrant,

    #[error("Account is disabled")]
    UserDisabled,

    #[error("Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A token grant as received on the token endpoint.
#[derive(Debug, Clone)]
pub enum Grant<'a> {
    Password { username: &'a str, password: &'a str },
    RefreshToken { refresh_token: &'a str },
}

/// Tokens plus the account they were issued to.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub user_id: Uuid,
    pub tokens: TokenPair,
}

pub struct AuthService {
    users: UserRepository,
    jwt: Arc<JwtConfig>,
    client: OAuthClientConfig,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>, client: OAuthClientConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt,
            client,
        }
    }

    /// Checks the presented client credentials against the registered client.
    ///
    /// An empty configured digest means the client is public and only the id
    /// is compared.
    pub fn verify_client(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> Result<(), AuthError> {
        if client_id != self.client.client_id {
            return Err(AuthError::InvalidClient);
        }
        if self.client.client_secret_sha256.is_empty() {
            return Ok(());
        }
        match client_secret {
            Some(secret) if verify_client_secret(secret, &self.client.client_secret_sha256) => {
                Ok(())
            }
            _ => Err(AuthError::InvalidClient),
        }
    }

    /// Runs a grant and issues a fresh token pair.
    pub async fn grant(&self, grant: Grant<'_>) -> Result<IssuedTokens, AuthError> {
        let user = match grant {
            Grant::Password { username, password } => {
                self.password_grant(username, password).await?
            }
            Grant::RefreshToken { refresh_token } => self.refresh_grant(refresh_token).await?,
        };

        let tokens = self
            .jwt
            .issue_pair(user.id, user.role.as_str(), &self.client.client_id)?;
        Ok(IssuedTokens {
            user_id: user.id,
            tokens,
        })
    }

    async fn password_grant(&self, login: &str, password: &str) -> Result<UserEntity, AuthError> {
        let user = self
            .users
            .find_by_login(login.trim())
            .await?
            .ok_or(AuthError::InvalidGrant)?;

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Password grant rejected");
            return Err(AuthError::InvalidGrant);
        }
        if !user.is_active {
            return Err(AuthError::UserDisabled);
        }

        info!(user_id = %user.id, role = %user.role, "Password grant issued");
        Ok(user)
    }

    async fn refresh_grant(&self, refresh_token: &str) -> Result<UserEntity, AuthError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|e| match e {
                JwtError::TokenExpired | JwtError::InvalidToken | JwtError::DecodingError(_) => {
                    AuthError::InvalidGrant
                }
                other => AuthError::Token(other),
            })?;

        if claims.client_id != self.client.client_id {
            return Err(AuthError::InvalidGrant);
        }
        let user_id = claims.user_id().map_err(|_| AuthError::InvalidGrant)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidGrant)?;
        if !user.is_active {
            return Err(AuthError::UserDisabled);
        }

        info!(user_id = %user.id, "Refresh grant issued");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::crypto::sha256_hex;

    fn service(secret_digest: &str) -> AuthService {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let jwt = Arc::new(
            JwtConfig::with_leeway(
                crate::test_keys::PRIVATE_KEY,
                crate::test_keys::PUBLIC_KEY,
                900,
                3600,
                0,
            )
            .unwrap(),
        );
        AuthService::new(
            pool,
            jwt,
            OAuthClientConfig {
                client_id: "registry-web".into(),
                client_secret_sha256: secret_digest.into(),
            },
        )
    }

    #[tokio::test]
    async fn test_verify_client_with_secret() {
        let svc = service(&sha256_hex("s3cret"));
        assert!(svc.verify_client("registry-web", Some("s3cret")).is_ok());
        assert!(matches!(
            svc.verify_client("registry-web", Some("wrong")),
            Err(AuthError::InvalidClient)
        ));
        assert!(matches!(
            svc.verify_client("registry-web", None),
            Err(AuthError::InvalidClient)
        ));
        assert!(matches!(
            svc.verify_client("other", Some("s3cret")),
            Err(AuthError::InvalidClient)
        ));
    }

    #[tokio::test]
    async fn test_verify_public_client() {
        let svc = service("");
        assert!(svc.verify_client("registry-web", None).is_ok());
        assert!(svc.verify_client("someone-else", None).is_err());
    }

    #[tokio::test]
    async fn test_refresh_grant_rejects_access_token() {
        let svc = service("");
        let pair = svc
            .jwt
            .issue_pair(Uuid::new_v4(), "STUDENT", "registry-web")
            .unwrap();
        let err = svc
            .grant(Grant::RefreshToken {
                refresh_token: &pair.access_token,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidGrant));
    }

    #[tokio::test]
    async fn test_refresh_grant_rejects_foreign_client() {
        let svc = service("");
        let pair = svc
            .jwt
            .issue_pair(Uuid::new_v4(), "STUDENT", "mobile-app")
            .unwrap();
        let err = svc
            .grant(Grant::RefreshToken {
                refresh_token: &pair.refresh_token,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidGrant));
    }
}
