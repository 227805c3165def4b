use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{instrument, warn};

use super::types::AccessClaims;
use crate::shared::{AppError, AppState};
use crate::user::models::Role;

/// JWT authentication middleware - validates the Authorization Bearer header
/// and adds AccessClaims to request extensions.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), auth::jwt_auth))
/// Handlers can then extract Extension(claims): Extension<AccessClaims>.
///
/// Runs strictly before any role evaluation: a missing or invalid token is
/// always 401, never 403.
#[instrument(skip(state, req, next))]
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extract token from Authorization Bearer header
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing Authorization header in request");
            AppError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Invalid Authorization header format (expected Bearer token)");
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    // Stateless verification against the access secret; no repository call
    let claims = state.tokens.verify_access(token).inspect_err(|e| {
        warn!("JWT authentication failed: {}", e);
    })?;

    // Add claims to request extensions for handlers to use
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Role gate over a verified access-token payload. Stateless and
/// side-effect-free: allows the call iff the claim's role is in the
/// permitted set.
pub fn authorize(claims: &AccessClaims, permitted: &[Role]) -> Result<(), AppError> {
    if permitted.contains(&claims.role) {
        Ok(())
    } else {
        warn!(user_id = %claims.sub, role = %claims.role, "Role not permitted for operation");
        Err(AppError::Forbidden)
    }
}

/// Admin-only gate. Layer it after `jwt_auth` so the claims extension is
/// already populated.
#[instrument(skip(req, next))]
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<AccessClaims>()
        .ok_or_else(|| AppError::Unauthorized("Missing authorization".to_string()))?;

    authorize(claims, &[Role::Admin])?;

    Ok(next.run(req).await)
}
