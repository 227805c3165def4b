use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::RetreatModel,
    service::RetreatService,
    types::{CreateRetreatRequest, ListRetreatsQuery, PaginatedRetreats, UpdateRetreatRequest},
};
use crate::shared::{AppError, AppState};

fn service(state: &AppState) -> RetreatService {
    RetreatService::new(
        Arc::clone(&state.retreat_repository),
        Arc::clone(&state.servantee_repository),
    )
}

/// HTTP handler for creating a retreat
///
/// POST /retreats
#[instrument(name = "create_retreat", skip(state, request))]
pub async fn create_retreat(
    State(state): State<AppState>,
    Json(request): Json<CreateRetreatRequest>,
) -> Result<(StatusCode, Json<RetreatModel>), AppError> {
    info!(name = %request.name, "Creating new retreat");

    let retreat = service(&state).create(request).await?;

    Ok((StatusCode::CREATED, Json(retreat)))
}

/// HTTP handler for the paginated, searchable retreat listing
///
/// GET /retreats?page=&limit=&search=
#[instrument(name = "list_retreats", skip(state))]
pub async fn list_retreats(
    State(state): State<AppState>,
    Query(query): Query<ListRetreatsQuery>,
) -> Result<Json<PaginatedRetreats>, AppError> {
    let listing = service(&state)
        .find_all(query.page, query.limit, query.search)
        .await?;

    info!(
        total = listing.total,
        page = listing.page,
        "Retreats listed"
    );
    Ok(Json(listing))
}

/// GET /retreats/:id
#[instrument(name = "get_retreat", skip(state))]
pub async fn get_retreat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RetreatModel>, AppError> {
    let retreat = service(&state).find_one(&id).await?;
    Ok(Json(retreat))
}

/// GET /retreats/servantee/:id - a servantee's most recent retreats
#[instrument(name = "get_retreats_for_servantee", skip(state))]
pub async fn get_retreats_for_servantee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<RetreatModel>>, AppError> {
    let retreats = service(&state).find_by_servantee(&id).await?;
    Ok(Json(retreats))
}

/// PATCH /retreats/:id
#[instrument(name = "update_retreat", skip(state, request))]
pub async fn update_retreat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateRetreatRequest>,
) -> Result<Json<RetreatModel>, AppError> {
    let retreat = service(&state).update(&id, request).await?;
    Ok(Json(retreat))
}

/// DELETE /retreats/:id
#[instrument(name = "delete_retreat", skip(state))]
pub async fn delete_retreat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RetreatModel>, AppError> {
    let retreat = service(&state).remove(&id).await?;

    info!(retreat_id = %id, "Retreat deleted successfully");
    Ok(Json(retreat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        routing::post,
        Router,
    };
    use chrono::{Duration, Utc};
    use tower::ServiceExt; // for `oneshot`

    fn app() -> Router {
        let app_state = AppStateBuilder::new().build();
        Router::new()
            .route("/retreats", post(create_retreat).get(list_retreats))
            .route(
                "/retreats/:id",
                get(get_retreat).patch(update_retreat).delete(delete_retreat),
            )
            .with_state(app_state)
    }

    fn post_retreat(name: &str, start_offset_days: i64, end_offset_days: i64) -> Request<Body> {
        let start = Utc::now() + Duration::days(start_offset_days);
        let end = Utc::now() + Duration::days(end_offset_days);
        let body = format!(
            r#"{{"name": "{}", "location": "Alexandria", "start_date": "{}", "end_date": "{}"}}"#,
            name,
            start.to_rfc3339(),
            end.to_rfc3339()
        );
        Request::builder()
            .method("POST")
            .uri("/retreats")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_retreat_handler() {
        let app = app();

        let response = app.oneshot(post_retreat("Summer", 1, 4)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let retreat: RetreatModel = serde_json::from_slice(&body).unwrap();
        assert_eq!(retreat.name, "Summer");
    }

    #[tokio::test]
    async fn test_create_retreat_reversed_dates_bad_request() {
        let app = app();

        let response = app.oneshot(post_retreat("Broken", 4, 1)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_retreats_paginated_envelope() {
        let app = app();

        let response = app
            .clone()
            .oneshot(post_retreat("Summer", 1, 4))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let request = Request::builder()
            .method("GET")
            .uri("/retreats?page=1&limit=5&search=summ")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let listing: PaginatedRetreats = serde_json::from_slice(&body).unwrap();
        assert_eq!(listing.total, 1);
        assert_eq!(listing.limit, 5);
        assert_eq!(listing.data[0].name, "Summer");
    }
}
