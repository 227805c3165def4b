use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::NoteModel;
use crate::shared::AppError;

/// Trait for note repository operations
#[async_trait]
pub trait NoteRepository {
    async fn create_note(&self, note: &NoteModel) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<NoteModel>, AppError>;
    async fn find_by_servantee(&self, servantee_id: &str) -> Result<Vec<NoteModel>, AppError>;
    async fn find_by_retreat(&self, retreat_id: &str) -> Result<Vec<NoteModel>, AppError>;
    async fn update_note(&self, note: &NoteModel) -> Result<(), AppError>;
    async fn delete_note(&self, id: &str) -> Result<(), AppError>;
}

/// In-memory implementation of NoteRepository for development and testing
pub struct InMemoryNoteRepository {
    notes: Mutex<HashMap<String, NoteModel>>,
}

impl Default for InMemoryNoteRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryNoteRepository {
    pub fn new() -> Self {
        Self {
            notes: Mutex::new(HashMap::new()),
        }
    }

    fn collect_sorted<F>(&self, predicate: F) -> Vec<NoteModel>
    where
        F: Fn(&NoteModel) -> bool,
    {
        let notes = self.notes.lock().unwrap();
        let mut matching: Vec<NoteModel> = notes.values().filter(|n| predicate(n)).cloned().collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        matching
    }
}

#[async_trait]
impl NoteRepository for InMemoryNoteRepository {
    #[instrument(skip(self, note))]
    async fn create_note(&self, note: &NoteModel) -> Result<(), AppError> {
        debug!(note_id = %note.id, "Creating note in memory");

        let mut notes = self.notes.lock().unwrap();
        notes.insert(note.id.clone(), note.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<NoteModel>, AppError> {
        let notes = self.notes.lock().unwrap();
        Ok(notes.get(id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_servantee(&self, servantee_id: &str) -> Result<Vec<NoteModel>, AppError> {
        Ok(self.collect_sorted(|n| n.servantee_id.as_deref() == Some(servantee_id)))
    }

    #[instrument(skip(self))]
    async fn find_by_retreat(&self, retreat_id: &str) -> Result<Vec<NoteModel>, AppError> {
        Ok(self.collect_sorted(|n| n.retreat_id.as_deref() == Some(retreat_id)))
    }

    #[instrument(skip(self, note))]
    async fn update_note(&self, note: &NoteModel) -> Result<(), AppError> {
        let mut notes = self.notes.lock().unwrap();
        if !notes.contains_key(&note.id) {
            return Err(AppError::NotFound(format!(
                "Note with id {} not found",
                note.id
            )));
        }
        notes.insert(note.id.clone(), note.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_note(&self, id: &str) -> Result<(), AppError> {
        let mut notes = self.notes.lock().unwrap();
        if notes.remove(id).is_none() {
            return Err(AppError::NotFound(format!("Note with id {} not found", id)));
        }
        Ok(())
    }
}

/// PostgreSQL implementation of the note repository
pub struct PostgresNoteRepository {
    pool: PgPool,
}

impl PostgresNoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_note(row: &sqlx::postgres::PgRow) -> NoteModel {
        NoteModel {
            id: row.get("id"),
            content: row.get("content"),
            servantee_id: row.get("servantee_id"),
            retreat_id: row.get("retreat_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl NoteRepository for PostgresNoteRepository {
    #[instrument(skip(self, note))]
    async fn create_note(&self, note: &NoteModel) -> Result<(), AppError> {
        debug!(note_id = %note.id, "Creating note in database");

        sqlx::query(
            "INSERT INTO notes (id, content, servantee_id, retreat_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&note.id)
        .bind(&note.content)
        .bind(&note.servantee_id)
        .bind(&note.retreat_id)
        .bind(note.created_at)
        .bind(note.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create note in database");
            AppError::Database(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<NoteModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, content, servantee_id, retreat_id, created_at, updated_at \
             FROM notes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, note_id = %id, "Failed to fetch note");
            AppError::Database(e.to_string())
        })?;

        Ok(row.as_ref().map(Self::row_to_note))
    }

    #[instrument(skip(self))]
    async fn find_by_servantee(&self, servantee_id: &str) -> Result<Vec<NoteModel>, AppError> {
        let rows = sqlx::query(
            "SELECT id, content, servantee_id, retreat_id, created_at, updated_at \
             FROM notes WHERE servantee_id = $1 ORDER BY created_at",
        )
        .bind(servantee_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, servantee_id = %servantee_id, "Failed to fetch notes for servantee");
            AppError::Database(e.to_string())
        })?;

        Ok(rows.iter().map(Self::row_to_note).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_retreat(&self, retreat_id: &str) -> Result<Vec<NoteModel>, AppError> {
        let rows = sqlx::query(
            "SELECT id, content, servantee_id, retreat_id, created_at, updated_at \
             FROM notes WHERE retreat_id = $1 ORDER BY created_at",
        )
        .bind(retreat_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, retreat_id = %retreat_id, "Failed to fetch notes for retreat");
            AppError::Database(e.to_string())
        })?;

        Ok(rows.iter().map(Self::row_to_note).collect())
    }

    #[instrument(skip(self, note))]
    async fn update_note(&self, note: &NoteModel) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE notes SET content = $2, updated_at = $3 WHERE id = $1")
            .bind(&note.id)
            .bind(&note.content)
            .bind(note.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, note_id = %note.id, "Failed to update note");
                AppError::Database(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Note with id {} not found",
                note.id
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_note(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, note_id = %id, "Failed to delete note");
                AppError::Database(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Note with id {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::note::types::CreateNoteRequest;

    fn test_note(content: &str, servantee_id: Option<&str>, retreat_id: Option<&str>) -> NoteModel {
        NoteModel::new(CreateNoteRequest {
            content: content.to_string(),
            servantee_id: servantee_id.map(String::from),
            retreat_id: retreat_id.map(String::from),
        })
    }

    #[tokio::test]
    async fn test_create_and_find_note() {
        let repo = InMemoryNoteRepository::new();
        let note = test_note("First visit", Some("servantee-1"), None);

        repo.create_note(&note).await.unwrap();

        let found = repo.find_by_id(&note.id).await.unwrap();
        assert_eq!(found.unwrap().content, "First visit");
    }

    #[tokio::test]
    async fn test_find_by_parent_filters() {
        let repo = InMemoryNoteRepository::new();
        repo.create_note(&test_note("a", Some("servantee-1"), None))
            .await
            .unwrap();
        repo.create_note(&test_note("b", Some("servantee-1"), Some("retreat-1")))
            .await
            .unwrap();
        repo.create_note(&test_note("c", None, Some("retreat-1")))
            .await
            .unwrap();

        let for_servantee = repo.find_by_servantee("servantee-1").await.unwrap();
        assert_eq!(for_servantee.len(), 2);

        let for_retreat = repo.find_by_retreat("retreat-1").await.unwrap();
        assert_eq!(for_retreat.len(), 2);

        let none = repo.find_by_servantee("servantee-2").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_note() {
        let repo = InMemoryNoteRepository::new();
        let mut note = test_note("draft", Some("servantee-1"), None);
        repo.create_note(&note).await.unwrap();

        note.content = "final".to_string();
        repo.update_note(&note).await.unwrap();
        let stored = repo.find_by_id(&note.id).await.unwrap().unwrap();
        assert_eq!(stored.content, "final");

        repo.delete_note(&note.id).await.unwrap();
        assert!(repo.find_by_id(&note.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_nonexistent_note() {
        let repo = InMemoryNoteRepository::new();
        let result = repo.delete_note("nonexistent-id").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
