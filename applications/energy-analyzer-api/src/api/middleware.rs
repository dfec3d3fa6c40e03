use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use super::handlers::AppState;
use crate::error::AppError;

/// Identity taken from a validated bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
}

/// Token from an `Authorization: Bearer <token>` header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// A present token must always be valid. A missing one is only
// rejected while auth.required is on.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match bearer_token(request.headers()) {
        Some(token) => {
            let claims = state.auth.authenticate(token).map_err(|e| {
                debug!("JWT validation failed: {}", e);
                e
            })?;
            let user = AuthenticatedUser {
                user_id: claims.user_id()?,
                email: claims.email,
            };
            debug!(user_id = %user.user_id, "Authenticated via bearer token");
            request.extensions_mut().insert(user);
        }
        None if state.auth.required() => {
            debug!("No valid Authorization header found");
            return Err(AppError::Unauthorized("Missing bearer token".to_string()));
        }
        None => {}
    }

    Ok(next.run(request).await)
}
