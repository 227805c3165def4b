use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::CreateRetreatRequest;

/// Database model for the retreats table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetreatModel {
    pub id: String, // UUID v4 as string
    pub name: String,
    pub location: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub attendee_ids: Vec<String>,
    pub note_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RetreatModel {
    /// Creates a new retreat with a generated ID and timestamps. Date
    /// ordering and attendee existence are the service's concern.
    pub fn new(request: CreateRetreatRequest) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            location: request.location,
            start_date: request.start_date,
            end_date: request.end_date,
            attendee_ids: request.attendee_ids,
            note_ids: request.note_ids,
            created_at: now,
            updated_at: now,
        }
    }
}
