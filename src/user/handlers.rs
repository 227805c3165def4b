use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::UserService,
    types::{CreateUserRequest, UpdateUserRequest, UserResponse},
};
use crate::shared::{AppError, AppState};

/// HTTP handler for admin-initiated user creation
///
/// POST /users
#[instrument(name = "create_user", skip(state, request))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    info!(email = %request.email, "Creating new user");

    let service = UserService::new(Arc::clone(&state.user_repository));
    let user = service.create(request).await?;

    info!(user_id = %user.id, "User created successfully");
    Ok((StatusCode::CREATED, Json(user)))
}

/// HTTP handler for listing all users
///
/// GET /users
#[instrument(name = "list_users", skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let service = UserService::new(Arc::clone(&state.user_repository));
    let users = service.find_all().await?;

    info!(user_count = users.len(), "Users listed successfully");
    Ok(Json(users))
}

/// HTTP handler for fetching a single user
///
/// GET /users/:id
#[instrument(name = "get_user", skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let service = UserService::new(Arc::clone(&state.user_repository));
    let user = service.find_one(&id).await?;
    Ok(Json(user))
}

/// HTTP handler for partial user updates
///
/// PATCH /users/:id
#[instrument(name = "update_user", skip(state, request))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let service = UserService::new(Arc::clone(&state.user_repository));
    let user = service.update(&id, request).await?;
    Ok(Json(user))
}

/// HTTP handler for deleting a user
///
/// DELETE /users/:id
#[instrument(name = "delete_user", skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let service = UserService::new(Arc::clone(&state.user_repository));
    let user = service.remove(&id).await?;

    info!(user_id = %id, "User deleted successfully");
    Ok(Json(user))
}
