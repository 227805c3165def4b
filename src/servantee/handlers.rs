use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::ServanteeModel,
    service::ServanteeService,
    types::{CreateServanteeRequest, UpdateServanteeRequest},
};
use crate::auth::AccessClaims;
use crate::shared::{AppError, AppState};

/// HTTP handler for creating a servantee
///
/// POST /servantees
#[instrument(name = "create_servantee", skip(state, claims, request))]
pub async fn create_servantee(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(request): Json<CreateServanteeRequest>,
) -> Result<(StatusCode, Json<ServanteeModel>), AppError> {
    info!(name = %request.name, "Creating new servantee");

    let service = ServanteeService::new(Arc::clone(&state.servantee_repository));
    let servantee = service.create(request, Some(claims.sub)).await?;

    Ok((StatusCode::CREATED, Json(servantee)))
}

/// HTTP handler for listing servantees
///
/// GET /servantees
#[instrument(name = "list_servantees", skip(state))]
pub async fn list_servantees(
    State(state): State<AppState>,
) -> Result<Json<Vec<ServanteeModel>>, AppError> {
    let service = ServanteeService::new(Arc::clone(&state.servantee_repository));
    let servantees = service.find_all().await?;

    info!(servantee_count = servantees.len(), "Servantees listed");
    Ok(Json(servantees))
}

/// GET /servantees/:id
#[instrument(name = "get_servantee", skip(state))]
pub async fn get_servantee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ServanteeModel>, AppError> {
    let service = ServanteeService::new(Arc::clone(&state.servantee_repository));
    let servantee = service.find_one(&id).await?;
    Ok(Json(servantee))
}

/// PATCH /servantees/:id
#[instrument(name = "update_servantee", skip(state, claims, request))]
pub async fn update_servantee(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(id): Path<String>,
    Json(request): Json<UpdateServanteeRequest>,
) -> Result<Json<ServanteeModel>, AppError> {
    let service = ServanteeService::new(Arc::clone(&state.servantee_repository));
    let servantee = service.update(&id, request, Some(claims.sub)).await?;
    Ok(Json(servantee))
}

/// DELETE /servantees/:id
#[instrument(name = "delete_servantee", skip(state))]
pub async fn delete_servantee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ServanteeModel>, AppError> {
    let service = ServanteeService::new(Arc::clone(&state.servantee_repository));
    let servantee = service.remove(&id).await?;

    info!(servantee_id = %id, "Servantee deleted successfully");
    Ok(Json(servantee))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use crate::user::models::Role;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn claims() -> AccessClaims {
        AccessClaims {
            sub: "user-1".to_string(),
            email: "servant@x.com".to_string(),
            role: Role::Servant,
            exp: 0,
            iat: 0,
        }
    }

    // Claims are injected directly instead of running the jwt_auth layer;
    // middleware behavior has its own tests.
    fn app() -> Router {
        let app_state = AppStateBuilder::new().build();
        Router::new()
            .route("/servantees", post(create_servantee).get(list_servantees))
            .route(
                "/servantees/:id",
                get(get_servantee)
                    .patch(update_servantee)
                    .delete(delete_servantee),
            )
            .layer(Extension(claims()))
            .with_state(app_state)
    }

    fn post_servantee(phone: &str) -> Request<Body> {
        let body = format!(r#"{{"phone": "{}", "name": "Mina"}}"#, phone);
        Request::builder()
            .method("POST")
            .uri("/servantees")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_servantee_handler() {
        let app = app();

        let response = app.oneshot(post_servantee("+201")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let servantee: ServanteeModel = serde_json::from_slice(&body).unwrap();
        assert_eq!(servantee.phone, "+201");
        assert_eq!(servantee.created_by.as_deref(), Some("user-1"));
    }

    #[tokio::test]
    async fn test_create_servantee_duplicate_phone_conflicts() {
        let app = app();

        let response = app.clone().oneshot(post_servantee("+201")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app.oneshot(post_servantee("+201")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_get_missing_servantee_not_found() {
        let app = app();

        let request = Request::builder()
            .method("GET")
            .uri("/servantees/no-such-id")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
