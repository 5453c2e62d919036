use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    Error, HttpMessage, HttpRequest,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use uuid::Uuid;

use crate::errors::AppError;
use crate::schema::{AuthUser, JWTClaims};

fn decode_bearer(req: &ServiceRequest) -> Result<AuthUser, AppError> {
    let authorization = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Unauthorized("Not authorized, token missing".to_string()))?;

    let token = authorization
        .to_str()
        .map_err(|_e| AppError::Unauthorized("Invalid token".to_string()))?;

    // the header may carry a bare token or the usual Bearer prefix
    let token = token.strip_prefix("Bearer ").unwrap_or(token);

    let key = std::env::var("JWT_SECRET").map_err(|_e| AppError::Internal)?;

    let decoded = decode::<JWTClaims>(
        token,
        &DecodingKey::from_secret(key.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_e| AppError::Unauthorized("Invalid token".to_string()))?;

    let id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_e| AppError::Unauthorized("Invalid token".to_string()))?;

    Ok(AuthUser {
        id,
        role: decoded.claims.role,
    })
}

/// Authenticates the request and attaches the caller identity to the
/// request extensions. 401 on a missing or invalid credential.
pub async fn protect(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let user = decode_bearer(&req)?;

    req.extensions_mut().insert(user);
    next.call(req).await
}

/// Role gate for instructor-only scopes; assumes `protect` already ran.
pub async fn require_instructor(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let user = req.extensions().get::<AuthUser>().copied();

    match user {
        Some(user) if user.can_manage_courses() => {}
        Some(_) => {
            return Err(Error::from(AppError::Forbidden(
                "Requires an instructor or admin role".to_string(),
            )))
        }
        None => {
            return Err(Error::from(AppError::Unauthorized(
                "Not authorized, token missing".to_string(),
            )))
        }
    }

    next.call(req).await
}

/// Identity set by `protect`, for handlers living in protected scopes.
pub fn current_user(req: &HttpRequest) -> Result<AuthUser, AppError> {
    req.extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| AppError::Unauthorized("Not authorized, token missing".to_string()))
}
