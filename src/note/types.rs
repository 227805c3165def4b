use serde::{Deserialize, Serialize};

/// Request body for POST /notes. At least one of `servantee_id` /
/// `retreat_id` must be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub content: String,
    pub servantee_id: Option<String>,
    pub retreat_id: Option<String>,
}

/// Partial update for PATCH /notes/:id
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    pub content: Option<String>,
}
