use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::NoteModel,
    service::NoteService,
    types::{CreateNoteRequest, UpdateNoteRequest},
};
use crate::shared::{AppError, AppState};

fn service(state: &AppState) -> NoteService {
    NoteService::new(
        Arc::clone(&state.note_repository),
        Arc::clone(&state.servantee_repository),
        Arc::clone(&state.retreat_repository),
    )
}

/// HTTP handler for creating a note
///
/// POST /notes
#[instrument(name = "create_note", skip(state, request))]
pub async fn create_note(
    State(state): State<AppState>,
    Json(request): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteModel>), AppError> {
    let note = service(&state).create(request).await?;

    info!(note_id = %note.id, "Note created successfully");
    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /notes/:id
#[instrument(name = "get_note", skip(state))]
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NoteModel>, AppError> {
    let note = service(&state).find_one(&id).await?;
    Ok(Json(note))
}

/// GET /notes/servantee/:id
#[instrument(name = "get_notes_for_servantee", skip(state))]
pub async fn get_notes_for_servantee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<NoteModel>>, AppError> {
    let notes = service(&state).find_for_servantee(&id).await?;
    Ok(Json(notes))
}

/// GET /notes/retreat/:id
#[instrument(name = "get_notes_for_retreat", skip(state))]
pub async fn get_notes_for_retreat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<NoteModel>>, AppError> {
    let notes = service(&state).find_for_retreat(&id).await?;
    Ok(Json(notes))
}

/// PATCH /notes/:id
#[instrument(name = "update_note", skip(state, request))]
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateNoteRequest>,
) -> Result<Json<NoteModel>, AppError> {
    let note = service(&state).update(&id, request).await?;
    Ok(Json(note))
}

/// DELETE /notes/:id
#[instrument(name = "delete_note", skip(state))]
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NoteModel>, AppError> {
    let note = service(&state).remove(&id).await?;

    info!(note_id = %id, "Note deleted successfully");
    Ok(Json(note))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::servantee::models::ServanteeModel;
    use crate::servantee::repository::{InMemoryServanteeRepository, ServanteeRepository};
    use crate::servantee::types::CreateServanteeRequest;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::post,
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    async fn app_with_servantee() -> (Router, String) {
        let servantees = Arc::new(InMemoryServanteeRepository::new());
        let servantee = ServanteeModel::new(
            CreateServanteeRequest {
                phone: "+201".to_string(),
                name: "Mina".to_string(),
                birth_date: None,
                education: None,
                year: None,
                church: None,
                retreat_dates: Vec::new(),
                note_ids: Vec::new(),
                is_active: None,
            },
            None,
        );
        servantees.create_servantee(&servantee).await.unwrap();

        let app_state = AppStateBuilder::new()
            .with_servantee_repository(servantees)
            .build();
        let app = Router::new()
            .route("/notes", post(create_note))
            .with_state(app_state);

        (app, servantee.id)
    }

    fn post_note(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/notes")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_note_handler() {
        let (app, servantee_id) = app_with_servantee().await;

        let body = format!(
            r#"{{"content": "First visit", "servantee_id": "{}"}}"#,
            servantee_id
        );
        let response = app.oneshot(post_note(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let note: NoteModel = serde_json::from_slice(&body).unwrap();
        assert_eq!(note.content, "First visit");
    }

    #[tokio::test]
    async fn test_create_note_without_parent_bad_request() {
        let (app, _) = app_with_servantee().await;

        let response = app
            .oneshot(post_note(r#"{"content": "orphan"}"#.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_note_unknown_servantee_not_found() {
        let (app, _) = app_with_servantee().await;

        let response = app
            .oneshot(post_note(
                r#"{"content": "dangling", "servantee_id": "ghost-id"}"#.to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
