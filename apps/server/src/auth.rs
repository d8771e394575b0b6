//! JWT authentication module.
//!
//! Tokens are issued by the external auth service and signed with the
//! shared HS256 secret. This module only verifies them and turns the claims
//! into a [`Caller`] that is handed explicitly to every service call.
//!
//! ```text
//!   Authorization: Bearer eyJ...
//!        │  extract_bearer_token
//!        ▼
//!   JwtVerifier::verify ──► Claims { sub, role, exp }
//!        │
//!        ▼
//!   Authenticated(Caller { employee_id: sub, role })
//! ```

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use stockroom_core::{Caller, Role};

use crate::error::ApiError;
use crate::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (employee id)
    pub sub: String,

    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Verifies bearer tokens.
pub struct JwtVerifier {
    decoding: DecodingKey,
    encoding: EncodingKey,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        JwtVerifier {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Validate and decode a token.
    pub fn verify(&self, token: &str) -> Result<Caller, ApiError> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            ApiError::unauthorized("Not authorized, token failed")
        })?;

        Ok(Caller::new(data.claims.sub, data.claims.role))
    }

    /// Signs a token for `caller`. The auth service does this in
    /// production; the server uses it for tooling and tests.
    pub fn issue(&self, caller: &Caller, lifetime: Duration) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            sub: caller.employee_id.clone(),
            role: caller.role,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign token");
            ApiError::unauthorized("Token could not be issued")
        })
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The verified caller of a request.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Caller);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Not authorized, no token"))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::unauthorized("Not authorized, no token"))?;

        state.verifier.verify(token).map(Authenticated)
    }
}
