//! Bearer token issuance and the role guard.
//!
//! Tokens are HS256 JWTs whose space-separated `scope` claim lists the roles
//! the holder may act as. Route groups are guarded by [`require_role`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::config::AuthConfig;
use crate::error::ApiError;

/// Subject recorded in issued tokens. There are no user accounts, so every
/// token carries the same subject.
const SUBJECT: &str = "oos-client";

/// Clock skew tolerated when checking `exp` and `iat`.
const LEEWAY_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("authorization header is not a bearer token")]
    MalformedHeader,

    #[error("invalid token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// A caller role, used as the token scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Provider,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Provider => "provider",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "provider" => Ok(Role::Provider),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// JWT claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    /// Space-separated role names.
    pub scope: String,
}

impl Claims {
    pub fn has_scope(&self, expected: &str) -> bool {
        self.scope.split(' ').any(|scope| scope == expected)
    }
}

/// Login response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub user_role: Role,
    /// Ready-to-send `Authorization` header value.
    #[schema(example = "Bearer eyJhbGciOiJIUzI1NiJ9...")]
    pub jwt_token: String,
}

/// Signs and verifies tokens with the configured secret.
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl TokenAuthority {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.leeway = LEEWAY_SECS;

        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::seconds(i64::try_from(config.token_ttl_secs).unwrap_or(i64::MAX)),
        }
    }

    /// Issues a token scoped to `role`.
    pub fn issue(&self, role: Role) -> Result<Token, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            sub: SUBJECT.to_string(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.ttl)
                .unwrap_or(now)
                .timestamp(),
            scope: role.as_str().to_string(),
        };
        let jwt = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;

        Ok(Token {
            user_role: role,
            jwt_token: format!("Bearer {jwt}"),
        })
    }

    /// Checks signature, issuer, audience and expiry.
    pub fn verify(&self, jwt: &str) -> Result<Claims, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(jwt, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }

    /// Verifies the token carried by an `Authorization` header value.
    pub fn verify_header(&self, header: Option<&str>) -> Result<Claims, AuthError> {
        let header = header.ok_or(AuthError::MissingToken)?;
        let jwt = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MalformedHeader)?;
        self.verify(jwt.trim())
    }
}

/// State for [`require_role`]: the verifier plus the role a route group needs.
#[derive(Clone)]
pub struct RoleGuard {
    pub authority: Arc<TokenAuthority>,
    pub role: Role,
}

impl RoleGuard {
    pub fn new(authority: Arc<TokenAuthority>, role: Role) -> Self {
        Self { authority, role }
    }
}

/// Middleware rejecting requests without a valid token scoped to the guard's
/// role. Verified claims are stored in the request extensions.
pub async fn require_role(
    State(guard): State<RoleGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let claims = guard
        .authority
        .verify_header(header)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    if !claims.has_scope(guard.role.as_str()) {
        tracing::warn!(required = %guard.role, scope = %claims.scope, "insufficient scope");
        return Err(ApiError::InsufficientScope);
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
