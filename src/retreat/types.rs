use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::RetreatModel;

/// Request body for POST /retreats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRetreatRequest {
    pub name: String,
    pub location: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub attendee_ids: Vec<String>,
    #[serde(default)]
    pub note_ids: Vec<String>,
}

/// Partial update for PATCH /retreats/:id
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateRetreatRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub attendee_ids: Option<Vec<String>>,
    pub note_ids: Option<Vec<String>>,
}

/// Query string for GET /retreats
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListRetreatsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

/// Paginated listing envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedRetreats {
    pub data: Vec<RetreatModel>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}
