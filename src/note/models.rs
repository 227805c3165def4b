use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::CreateNoteRequest;

/// Database model for the notes table. Every note hangs off a servantee, a
/// retreat, or both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteModel {
    pub id: String, // UUID v4 as string
    pub content: String,
    pub servantee_id: Option<String>,
    pub retreat_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NoteModel {
    pub fn new(request: CreateNoteRequest) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            content: request.content,
            servantee_id: request.servantee_id,
            retreat_id: request.retreat_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_note_model() {
        let note = NoteModel::new(CreateNoteRequest {
            content: "Follow up next week".to_string(),
            servantee_id: Some("servantee-1".to_string()),
            retreat_id: None,
        });

        assert!(!note.id.is_empty());
        assert_eq!(note.content, "Follow up next week");
        assert_eq!(note.servantee_id.as_deref(), Some("servantee-1"));
        assert!(note.retreat_id.is_none());
    }
}
