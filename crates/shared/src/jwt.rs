//! Bearer token issuance and verification.
//!
//! Access and refresh tokens are RS256-signed JWTs. The `role` claim is a
//! hint for clients only; the API re-reads the caller's role from the store.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for token operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Type of token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Role label at issuance time.
    pub role: String,
    /// OAuth2 client the token was issued to.
    pub client_id: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub token_type: TokenType,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidToken)
    }
}

/// An access/refresh pair returned by the token endpoint.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Signing and verification keys plus token lifetimes.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    pub access_token_expiry_secs: i64,
    pub refresh_token_expiry_secs: i64,
    pub leeway_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("access_token_expiry_secs", &self.access_token_expiry_secs)
            .field("refresh_token_expiry_secs", &self.refresh_token_expiry_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

impl JwtConfig {
    /// Builds an RS256 config from a PEM key pair.
    pub fn with_leeway(
        private_key_pem: &str,
        public_key_pem: &str,
        access_token_expiry_secs: i64,
        refresh_token_expiry_secs: i64,
        leeway_secs: u64,
    ) -> Result<Self, JwtError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid private key: {}", e)))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid public key: {}", e)))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            algorithm: Algorithm::RS256,
            access_token_expiry_secs,
            refresh_token_expiry_secs,
            leeway_secs,
        })
    }

    /// HS256 config for unit tests. Never used outside tests.
    #[cfg(test)]
    pub fn new_for_testing(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: Algorithm::HS256,
            access_token_expiry_secs: 900,
            refresh_token_expiry_secs: 604800,
            leeway_secs: 0,
        }
    }

    /// Issues a fresh access/refresh pair for a user.
    pub fn issue_pair(
        &self,
        user_id: Uuid,
        role: &str,
        client_id: &str,
    ) -> Result<TokenPair, JwtError> {
        let access_token = self.issue(
            user_id,
            role,
            client_id,
            TokenType::Access,
            self.access_token_expiry_secs,
        )?;
        let refresh_token = self.issue(
            user_id,
            role,
            client_id,
            TokenType::Refresh,
            self.refresh_token_expiry_secs,
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_token_expiry_secs,
        })
    }

    /// Issues a single token.
    pub fn issue(
        &self,
        user_id: Uuid,
        role: &str,
        client_id: &str,
        token_type: TokenType,
        expiry_secs: i64,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            client_id: client_id.to_string(),
            exp: (now + Duration::seconds(expiry_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidToken,
                _ => JwtError::DecodingError(e.to_string()),
            }
        })?;

        if data.claims.token_type != expected {
            return Err(JwtError::InvalidToken);
        }
        Ok(data.claims)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate(token, TokenType::Access)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate(token, TokenType::Refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig::new_for_testing("registry_test_secret_0123456789")
    }

    #[test]
    fn test_issue_pair_roundtrip() {
        let cfg = config();
        let user_id = Uuid::new_v4();
        let pair = cfg.issue_pair(user_id, "STAFF", "registry-web").unwrap();

        let claims = cfg.validate_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.role, "STAFF");
        assert_eq!(claims.client_id, "registry-web");
        assert_eq!(pair.expires_in, 900);

        let refresh = cfg.validate_refresh_token(&pair.refresh_token).unwrap();
        assert_eq!(refresh.token_type, TokenType::Refresh);
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let cfg = config();
        let pair = cfg.issue_pair(Uuid::new_v4(), "STUDENT", "c").unwrap();
        assert!(matches!(
            cfg.validate_access_token(&pair.refresh_token),
            Err(JwtError::InvalidToken)
        ));
        assert!(matches!(
            cfg.validate_refresh_token(&pair.access_token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let cfg = config();
        let token = cfg
            .issue(Uuid::new_v4(), "ADMIN", "c", TokenType::Access, -120)
            .unwrap();
        assert!(matches!(
            cfg.validate_access_token(&token),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let token = JwtConfig::new_for_testing("some_other_secret_value_abcdef")
            .issue(Uuid::new_v4(), "ADMIN", "c", TokenType::Access, 60)
            .unwrap();
        assert!(config().validate_access_token(&token).is_err());
    }

    #[test]
    fn test_malformed_subject() {
        let claims = Claims {
            sub: "not-a-uuid".into(),
            role: "ADMIN".into(),
            client_id: "c".into(),
            exp: 0,
            iat: 0,
            jti: "j".into(),
            token_type: TokenType::Access,
        };
        assert!(claims.user_id().is_err());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let debug = format!("{:?}", config());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("registry_test_secret"));
    }
}
