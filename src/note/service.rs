use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::NoteModel,
    repository::NoteRepository,
    types::{CreateNoteRequest, UpdateNoteRequest},
};
use crate::retreat::repository::RetreatRepository;
use crate::servantee::repository::ServanteeRepository;
use crate::shared::AppError;

/// Service for note management. A note must be attached to an existing
/// servantee, an existing retreat, or both.
pub struct NoteService {
    notes: Arc<dyn NoteRepository + Send + Sync>,
    servantees: Arc<dyn ServanteeRepository + Send + Sync>,
    retreats: Arc<dyn RetreatRepository + Send + Sync>,
}

impl NoteService {
    pub fn new(
        notes: Arc<dyn NoteRepository + Send + Sync>,
        servantees: Arc<dyn ServanteeRepository + Send + Sync>,
        retreats: Arc<dyn RetreatRepository + Send + Sync>,
    ) -> Self {
        Self {
            notes,
            servantees,
            retreats,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, request: CreateNoteRequest) -> Result<NoteModel, AppError> {
        if request.servantee_id.is_none() && request.retreat_id.is_none() {
            return Err(AppError::Validation(
                "A note requires a servantee id or a retreat id".to_string(),
            ));
        }

        if let Some(servantee_id) = &request.servantee_id {
            if self.servantees.find_by_id(servantee_id).await?.is_none() {
                return Err(AppError::NotFound(format!(
                    "Servantee with id {} not found",
                    servantee_id
                )));
            }
        }
        if let Some(retreat_id) = &request.retreat_id {
            if self.retreats.find_by_id(retreat_id).await?.is_none() {
                return Err(AppError::NotFound(format!(
                    "Retreat with id {} not found",
                    retreat_id
                )));
            }
        }

        let note = NoteModel::new(request);
        self.notes.create_note(&note).await?;

        info!(note_id = %note.id, "Note created");
        Ok(note)
    }

    #[instrument(skip(self))]
    pub async fn find_one(&self, id: &str) -> Result<NoteModel, AppError> {
        self.notes
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Note with id {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn find_for_servantee(&self, servantee_id: &str) -> Result<Vec<NoteModel>, AppError> {
        self.notes.find_by_servantee(servantee_id).await
    }

    #[instrument(skip(self))]
    pub async fn find_for_retreat(&self, retreat_id: &str) -> Result<Vec<NoteModel>, AppError> {
        self.notes.find_by_retreat(retreat_id).await
    }

    #[instrument(skip(self, request))]
    pub async fn update(&self, id: &str, request: UpdateNoteRequest) -> Result<NoteModel, AppError> {
        let mut note = self.find_one(id).await?;

        if let Some(content) = request.content {
            note.content = content;
        }
        note.updated_at = Utc::now();

        self.notes.update_note(&note).await?;

        info!(note_id = %note.id, "Note updated");
        Ok(note)
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> Result<NoteModel, AppError> {
        let note = self.find_one(id).await?;
        self.notes.delete_note(id).await?;

        info!(note_id = %id, "Note deleted");
        Ok(note)
    }
}
