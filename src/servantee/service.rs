use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::ServanteeModel,
    repository::ServanteeRepository,
    types::{CreateServanteeRequest, UpdateServanteeRequest},
};
use crate::shared::AppError;

/// Service for servantee record management
pub struct ServanteeService {
    repository: Arc<dyn ServanteeRepository + Send + Sync>,
}

impl ServanteeService {
    pub fn new(repository: Arc<dyn ServanteeRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        request: CreateServanteeRequest,
        created_by: Option<String>,
    ) -> Result<ServanteeModel, AppError> {
        if self
            .repository
            .find_by_phone(&request.phone)
            .await?
            .is_some()
        {
            return Err(AppError::PhoneExists(request.phone));
        }

        let servantee = ServanteeModel::new(request, created_by);
        self.repository.create_servantee(&servantee).await?;

        info!(servantee_id = %servantee.id, "Servantee created");
        Ok(servantee)
    }

    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<ServanteeModel>, AppError> {
        self.repository.list_servantees().await
    }

    #[instrument(skip(self))]
    pub async fn find_one(&self, id: &str) -> Result<ServanteeModel, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Servantee with id {} not found", id)))
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: &str,
        request: UpdateServanteeRequest,
        updated_by: Option<String>,
    ) -> Result<ServanteeModel, AppError> {
        let mut servantee = self.find_one(id).await?;

        if let Some(phone) = request.phone {
            // The number may only collide with a different servantee's row
            if let Some(existing) = self.repository.find_by_phone(&phone).await? {
                if existing.id != servantee.id {
                    return Err(AppError::PhoneExists(phone));
                }
            }
            servantee.phone = phone;
        }
        if let Some(name) = request.name {
            servantee.name = name;
        }
        if let Some(birth_date) = request.birth_date {
            servantee.birth_date = Some(birth_date);
        }
        if let Some(education) = request.education {
            servantee.education = Some(education);
        }
        if let Some(year) = request.year {
            servantee.year = Some(year);
        }
        if let Some(church) = request.church {
            servantee.church = Some(church);
        }
        if let Some(retreat_dates) = request.retreat_dates {
            servantee.retreat_dates = retreat_dates;
        }
        if let Some(note_ids) = request.note_ids {
            servantee.note_ids = note_ids;
        }
        if let Some(is_active) = request.is_active {
            servantee.is_active = is_active;
        }
        servantee.updated_by = updated_by;
        servantee.updated_at = Utc::now();

        self.repository.update_servantee(&servantee).await?;

        info!(servantee_id = %servantee.id, "Servantee updated");
        Ok(servantee)
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> Result<ServanteeModel, AppError> {
        let servantee = self.find_one(id).await?;
        self.repository.delete_servantee(id).await?;

        info!(servantee_id = %id, "Servantee deleted");
        Ok(servantee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::servantee::repository::InMemoryServanteeRepository;

    fn service() -> ServanteeService {
        ServanteeService::new(Arc::new(InMemoryServanteeRepository::new()))
    }

    fn create_request(phone: &str) -> CreateServanteeRequest {
        CreateServanteeRequest {
            phone: phone.to_string(),
            name: "Mina".to_string(),
            birth_date: None,
            education: None,
            year: None,
            church: None,
            retreat_dates: Vec::new(),
            note_ids: Vec::new(),
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_create_records_creator() {
        let service = service();
        let created = service
            .create(create_request("+201"), Some("admin-id".to_string()))
            .await
            .unwrap();

        assert_eq!(created.created_by.as_deref(), Some("admin-id"));
        assert!(created.is_active);
    }

    #[tokio::test]
    async fn test_create_duplicate_phone_conflicts() {
        let service = service();
        service.create(create_request("+201"), None).await.unwrap();

        let result = service.create(create_request("+201"), None).await;
        assert!(matches!(result, Err(AppError::PhoneExists(_))));
    }

    #[tokio::test]
    async fn test_update_patches_only_supplied_fields() {
        let service = service();
        let created = service.create(create_request("+201"), None).await.unwrap();

        let updated = service
            .update(
                &created.id,
                UpdateServanteeRequest {
                    church: Some("St Mark".to_string()),
                    is_active: Some(false),
                    ..Default::default()
                },
                Some("editor-id".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Mina"); // untouched
        assert_eq!(updated.church.as_deref(), Some("St Mark"));
        assert!(!updated.is_active);
        assert_eq!(updated.updated_by.as_deref(), Some("editor-id"));
    }

    #[tokio::test]
    async fn test_update_phone_collision() {
        let service = service();
        service.create(create_request("+201"), None).await.unwrap();
        let second = service.create(create_request("+202"), None).await.unwrap();

        let result = service
            .update(
                &second.id,
                UpdateServanteeRequest {
                    phone: Some("+201".to_string()),
                    ..Default::default()
                },
                None,
            )
            .await;
        assert!(matches!(result, Err(AppError::PhoneExists(_))));
    }

    #[tokio::test]
    async fn test_remove_missing_servantee() {
        let service = service();
        let result = service.remove("no-such-id").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
