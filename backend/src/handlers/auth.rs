//! Authentication handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use shared::{LoginCredentials, UserProfile};
use validator::Validate;

use crate::error::AppError;
use crate::middleware::CurrentSession;
use crate::services::AuthService;
use crate::AppState;

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 128))]
    pub username: String,
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    body.validate()?;

    let auth_service = AuthService::new(state.http.clone(), state.sessions.clone(), &state.config);
    let credentials = LoginCredentials {
        username: body.username.trim().to_string(),
        password: body.password,
    };
    let tokens = auth_service.login(&credentials).await?;

    Ok(Json(LoginResponse {
        access_token: tokens.access_token,
        token_type: tokens.token_type,
        expires_in: tokens.expires_in,
        user: tokens.user,
    }))
}

/// Logout endpoint handler
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentSession,
) -> StatusCode {
    let auth_service = AuthService::new(state.http.clone(), state.sessions.clone(), &state.config);
    auth_service.logout(&current.0.session_id);
    StatusCode::NO_CONTENT
}

/// Current user endpoint handler
pub async fn me(current: CurrentSession) -> Json<UserProfile> {
    Json(current.0.user)
}
