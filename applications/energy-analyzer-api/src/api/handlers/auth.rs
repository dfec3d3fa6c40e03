use axum::{extract::rejection::JsonRejection, extract::State, response::Json, Extension};

use super::{json_body, AppState};
use crate::api::middleware::AuthenticatedUser;
use crate::api::models::{LoginRequest, LoginResponse, MeResponse, SignupRequest, SignupResponse};
use crate::error::{AppError, Result};

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<SignupResponse>> {
    let request = json_body(payload)?;
    state
        .auth
        .signup(&request.name, &request.email, &request.password)
        .await?;

    Ok(Json(SignupResponse {
        message: "Signup successful".to_string(),
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let request = json_body(payload)?;
    let issued = state.auth.login(&request.email, &request.password).await?;

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_in: issued.expires_in,
    }))
}

/// GET /api/auth/me
/// Always needs a token, even when route protection is switched off.
pub async fn me(
    State(state): State<AppState>,
    user: Option<Extension<AuthenticatedUser>>,
) -> Result<Json<MeResponse>> {
    let Extension(user) =
        user.ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;
    let user = state.auth.current_user(user.user_id).await?;
    Ok(Json(user.into()))
}
