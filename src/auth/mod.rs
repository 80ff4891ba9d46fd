//! Bearer token authentication and resource authorization.
//!
//! Token verification happens once in the middleware; an invalid, expired or missing
//! token is rejected there with 401 and never reaches a handler. Handlers receive the
//! resulting [`AccessClaims`] as a request extension and run the access decision.

mod access;

pub use access::*;

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::DateTime;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Claims carried by the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Account the token was issued to.
    pub unique_name: String,
    #[serde(rename = "isSU", default, skip_serializing_if = "Option::is_none")]
    pub is_su: Option<bool>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Check signature and expiry and extract the access claims.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, AppError> {
        let data = decode::<TokenClaims>(token, &self.key, &self.validation).map_err(|err| {
            let message = match err.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                ErrorKind::InvalidSignature => "Invalid token signature",
                _ => "Invalid token",
            };
            tracing::debug!(error = %err, "token rejected");
            AppError::Unauthorized(message.to_string())
        })?;

        let claims = data.claims;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

        Ok(AccessClaims {
            account_identity: claims.unique_name,
            super_user: claims.is_su,
            expires_at,
        })
    }
}

/// Authentication layer: verifies the bearer token and stores the claims on the request.
pub async fn jwt_auth_layer(
    verifier: Arc<TokenVerifier>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return AppError::Unauthorized("Missing bearer token".to_string()).into_response();
    };

    match verifier.verify(&token) {
        Ok(claims) => {
            tracing::debug!(
                account = %claims.account_identity,
                expires_at = %claims.expires_at,
                "token accepted"
            );
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Run the access decision for a handler, mapping a denial to 403.
pub fn authorize(
    claims: &AccessClaims,
    policy: AccessPolicy,
    resource_owner: &str,
) -> Result<(), AppError> {
    if decide(policy, claims, resource_owner).is_allowed() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Not allowed to access resources of {}",
            resource_owner
        )))
    }
}
