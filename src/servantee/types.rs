use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request body for POST /servantees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServanteeRequest {
    pub phone: String,
    pub name: String,
    pub birth_date: Option<DateTime<Utc>>,
    pub education: Option<String>,
    pub year: Option<String>,
    pub church: Option<String>,
    #[serde(default)]
    pub retreat_dates: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub note_ids: Vec<String>,
    pub is_active: Option<bool>,
}

/// Partial update for PATCH /servantees/:id; absent fields are left untouched.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateServanteeRequest {
    pub phone: Option<String>,
    pub name: Option<String>,
    pub birth_date: Option<DateTime<Utc>>,
    pub education: Option<String>,
    pub year: Option<String>,
    pub church: Option<String>,
    pub retreat_dates: Option<Vec<DateTime<Utc>>>,
    pub note_ids: Option<Vec<String>>,
    pub is_active: Option<bool>,
}
