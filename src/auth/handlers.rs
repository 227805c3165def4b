use axum::{extract::State, http::StatusCode, Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::AuthService,
    types::{AccessClaims, LoginRequest, LoginResponse, RefreshRequest, RegisterResponse, TokenPair},
};
use crate::shared::{AppError, AppState};
use crate::user::types::{CreateUserRequest, UserResponse};

/// HTTP handler for account registration
///
/// POST /auth/register
#[instrument(name = "register", skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    info!(email = %request.email, "Registering new user");

    let service = AuthService::new(Arc::clone(&state.user_repository), state.tokens.clone());
    let registered = service.register(request).await?;

    info!(user_id = %registered.id, "Registration successful");
    Ok((StatusCode::CREATED, Json(registered)))
}

/// HTTP handler for login
///
/// POST /auth/login
/// Returns the freshly minted token pair and the caller's role.
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let service = AuthService::new(Arc::clone(&state.user_repository), state.tokens.clone());
    let response = service.login(&request.email, &request.password).await?;

    Ok(Json(response))
}

/// HTTP handler for refresh-token rotation
///
/// POST /auth/refresh
/// The presented token is single-use: a new pair comes back and the old
/// refresh token stops working.
#[instrument(name = "refresh", skip(state, request))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let service = AuthService::new(Arc::clone(&state.user_repository), state.tokens.clone());
    let pair = service.refresh(&request.refresh_token).await?;

    Ok(Json(pair))
}

/// HTTP handler for logout
///
/// POST /auth/logout (authenticated)
#[instrument(name = "logout", skip(state, claims))]
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<Value>, AppError> {
    let service = AuthService::new(Arc::clone(&state.user_repository), state.tokens.clone());
    service.logout(&claims.sub).await?;

    Ok(Json(json!({ "message": "Logged out successfully" })))
}

/// HTTP handler for the caller's own profile
///
/// GET /auth/profile (authenticated)
#[instrument(name = "profile", skip(state, claims))]
pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<UserResponse>, AppError> {
    let service = AuthService::new(Arc::clone(&state.user_repository), state.tokens.clone());
    let profile = service.profile(&claims.sub).await?;

    Ok(Json(profile))
}
