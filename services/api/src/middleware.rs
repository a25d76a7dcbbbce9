//! Authentication middleware for JWT token validation
//!
//! Tokens are issued by an external identity service. A request without an
//! `Authorization` header continues anonymously; a present but invalid
//! header is rejected with 401.

use anyhow::{Context, Result};
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::{debug, warn};

use crate::{config::JwtSettings, error::ApiError, state::AppState};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Expiration time
    pub exp: u64,
}

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
}

/// Verifies bearer tokens
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Build a verifier from settings
    ///
    /// A public key (PEM text or a path to a PEM file) selects RS256,
    /// otherwise the shared secret selects HS256.
    pub fn from_settings(settings: &JwtSettings) -> Result<Self> {
        if let Some(public_key) = settings.public_key.as_deref().filter(|key| !key.is_empty()) {
            let pem = read_pem(public_key)?;
            let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())
                .context("Failed to create decoding key")?;
            return Ok(Self::new(decoding_key, Algorithm::RS256));
        }

        match settings.secret.as_deref().filter(|secret| !secret.is_empty()) {
            Some(secret) => Ok(Self::hmac(secret)),
            None => anyhow::bail!("No JWT public key or secret configured"),
        }
    }

    /// HS256 verifier for a shared secret
    pub fn hmac(secret: &str) -> Self {
        Self::new(DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
    }

    fn new(decoding_key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key,
            validation,
        }
    }

    /// Validate a token and return the user id it names
    pub fn verify(&self, token: &str) -> Result<i64, ApiError> {
        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Failed to validate token: {}", e);
                ApiError::Unauthorized
            })?;

        token_data.claims.sub.parse::<i64>().map_err(|_| {
            warn!(sub = %token_data.claims.sub, "Token subject is not a user id");
            ApiError::Unauthorized
        })
    }
}

fn read_pem(value: &str) -> Result<String> {
    if value.starts_with("-----BEGIN") {
        return Ok(value.to_string());
    }

    let pem = std::fs::read_to_string(value)
        .or_else(|_| {
            let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            path.push(value);
            std::fs::read_to_string(path)
        })
        .with_context(|| format!("Failed to read public key file {}", value))?;

    Ok(pem.trim().to_string())
}

/// Authentication middleware
///
/// Inserts [`AuthUser`] into the request extensions when a valid token
/// names an existing user.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = match bearer {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(rejection) if rejection.is_missing() => return Ok(next.run(req).await),
        Err(rejection) => {
            debug!("Malformed authorization header: {}", rejection);
            return Err(ApiError::Unauthorized);
        }
    };

    let user_id = state.jwt.verify(bearer.token())?;

    let user = state
        .user_repository
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(AuthUser { id: user.id });

    Ok(next.run(req).await)
}

/// Extractor for endpoints that require authentication
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}

/// Extractor for endpoints open to anonymous callers
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|user| user.id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}
