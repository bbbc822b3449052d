//! Registration, login and session handlers

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{auth, AppError, AppState, AuthUser};
use outlay_core::models::User;

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token plus the authenticated user, returned by register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// POST /api/auth/register - Create an account and sign in
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(AppError::bad_request("Name and email are required"));
    }
    if req.password.len() < 8 {
        return Err(AppError::bad_request(
            "Password must be at least 8 characters",
        ));
    }

    let password_hash = auth::hash_password(&req.password)?;
    let user = state
        .db
        .create_user(req.name.trim(), req.email.trim(), &password_hash)?;
    info!(user_id = user.id, "User registered");

    let token = auth::issue_token(&user, &state.config.jwt_secret, state.config.token_ttl_hours)?;
    Ok(Json(AuthResponse { token, user }))
}

/// POST /api/auth/login - Exchange credentials for an access token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    // One failure message for both unknown email and bad password, so
    // login does not reveal which emails are registered.
    let user = state
        .db
        .find_user_by_email(req.email.trim())?
        .filter(|u| auth::verify_password(&req.password, &u.password_hash))
        .ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

    let token = auth::issue_token(&user, &state.config.jwt_secret, state.config.token_ttl_hours)?;
    Ok(Json(AuthResponse { token, user }))
}

/// GET /api/auth/me - The authenticated user
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<User>, AppError> {
    let user = state.db.get_user(auth_user.id)?;
    Ok(Json(user))
}
