use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::CreateServanteeRequest;

/// Database model for the servantees table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServanteeModel {
    pub id: String, // UUID v4 as string
    pub phone: String,
    pub name: String,
    pub birth_date: Option<DateTime<Utc>>,
    pub education: Option<String>,
    pub year: Option<String>,
    pub church: Option<String>,
    pub retreat_dates: Vec<DateTime<Utc>>,
    pub note_ids: Vec<String>,
    /// Maintained by the retreat service when attendance changes
    pub retreat_ids: Vec<String>,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServanteeModel {
    /// Creates a new servantee with a generated ID and timestamps.
    /// `created_by` is the id of the authenticated user making the call.
    pub fn new(request: CreateServanteeRequest, created_by: Option<String>) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            phone: request.phone,
            name: request.name,
            birth_date: request.birth_date,
            education: request.education,
            year: request.year,
            church: request.church,
            retreat_dates: request.retreat_dates,
            note_ids: request.note_ids,
            retreat_ids: Vec::new(),
            is_active: request.is_active.unwrap_or(true),
            created_by: created_by.clone(),
            updated_by: created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateServanteeRequest {
        CreateServanteeRequest {
            phone: "+20100000000".to_string(),
            name: "Mina".to_string(),
            birth_date: None,
            education: Some("Engineering".to_string()),
            year: None,
            church: None,
            retreat_dates: Vec::new(),
            note_ids: Vec::new(),
            is_active: None,
        }
    }

    #[test]
    fn test_new_servantee_defaults() {
        let model = ServanteeModel::new(request(), Some("creator-id".to_string()));

        assert!(!model.id.is_empty());
        assert!(model.is_active); // defaults to active
        assert!(model.retreat_ids.is_empty());
        assert_eq!(model.created_by.as_deref(), Some("creator-id"));
        assert_eq!(model.updated_by, model.created_by);
    }

    #[test]
    fn test_new_servantee_honors_explicit_inactive() {
        let mut req = request();
        req.is_active = Some(false);

        let model = ServanteeModel::new(req, None);
        assert!(!model.is_active);
        assert!(model.created_by.is_none());
    }
}
