use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRef, FromRequest, FromRequestParts, Request},
    http::{header::CONTENT_TYPE, request::Parts, HeaderMap},
};
use tracing::warn;
use uuid::Uuid;

use super::{
    claims::TokenKind,
    jwt::{JwtKeys, TokenError},
    validation::Validate,
};
use crate::error::AppError;

/// Extracts and validates the bearer session token, returning the user ID.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized("No token, authorization denied"))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(AppError::Unauthorized("Invalid Authorization header"))?;

        let keys = JwtKeys::from_ref(state);
        match keys.verify_kind(token.trim(), TokenKind::Session) {
            Ok(claims) => Ok(AuthUser(claims.sub)),
            Err(TokenError::Expired) => {
                warn!("expired session token");
                Err(AppError::Unauthorized("Token expired"))
            }
            Err(_) => {
                warn!("invalid session token");
                Err(AppError::Unauthorized("Token is not valid"))
            }
        }
    }
}

/// JSON body that has passed [`Validate`]; handlers never see unchecked input.
///
/// A request without a JSON content type or with an empty body is validated
/// as `{}`, so it gets the usual field errors. Only bytes that are not JSON
/// are rejected before validation.
pub struct Valid<T>(pub T);

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .map(|essence| {
            let essence = essence.trim().to_ascii_lowercase();
            essence == "application/json" || essence.ends_with("+json")
        })
        .unwrap_or(false)
}

#[async_trait]
impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json = is_json(req.headers());
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        let raw = if !json || bytes.iter().all(u8::is_ascii_whitespace) {
            T::Raw::default()
        } else {
            serde_json::from_slice::<T::Raw>(&bytes)
                .map_err(|e| AppError::BadRequest(format!("Malformed JSON body: {e}")))?
        };
        T::validate(raw).map(Valid).map_err(|errors| {
            warn!(failed = errors.len(), "request validation failed");
            AppError::Validation(errors)
        })
    }
}
