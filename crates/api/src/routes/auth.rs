//! OAuth2 token endpoint.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::app::AppState;
use crate::services::{AuthError, AuthService, Grant, TOKEN_SCOPE};

/// Form body of `POST /api/v1/auth/token`.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub client_id: String,
    pub client_secret: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub refresh_token: String,
    pub scope: &'static str,
}

#[derive(Debug, Serialize)]
struct OAuthErrorBody {
    error: &'static str,
    error_description: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::InvalidClient => (StatusCode::UNAUTHORIZED, "invalid_client"),
            AuthError::InvalidGrant | AuthError::UserDisabled => {
                (StatusCode::BAD_REQUEST, "invalid_grant")
            }
            AuthError::UnsupportedGrantType(_) => {
                (StatusCode::BAD_REQUEST, "unsupported_grant_type")
            }
            AuthError::MissingParameter(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AuthError::Token(_) | AuthError::Password(_) | AuthError::Database(_) => {
                error!(error = %self, "Token issuance failed");
                let body = OAuthErrorBody {
                    error: "server_error",
                    error_description: "An internal error occurred".to_string(),
                };
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };

        let body = OAuthErrorBody {
            error: code,
            error_description: self.to_string(),
        };
        (status, [(header::CACHE_CONTROL, "no-store")], Json(body)).into_response()
    }
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, AuthError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingParameter(name))
}

/// Issue tokens.
///
/// POST /api/v1/auth/token
pub async fn token(
    State(state): State<AppState>,
    Form(request): Form<TokenRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let service = AuthService::new(
        state.pool.clone(),
        state.jwt.clone(),
        state.config.oauth.clone(),
    );
    service.verify_client(&request.client_id, request.client_secret.as_deref())?;

    let grant = match request.grant_type.as_str() {
        "password" => Grant::Password {
            username: required(&request.username, "username")?,
            password: required(&request.password, "password")?,
        },
        "refresh_token" => Grant::RefreshToken {
            refresh_token: required(&request.refresh_token, "refresh_token")?,
        },
        other => return Err(AuthError::UnsupportedGrantType(other.to_string())),
    };

    let issued = service.grant(grant).await?;
    Ok(Json(TokenResponse {
        access_token: issued.tokens.access_token,
        token_type: "Bearer",
        expires_in: issued.tokens.expires_in,
        refresh_token: issued.tokens.refresh_token,
        scope: TOKEN_SCOPE,
    }))
}
