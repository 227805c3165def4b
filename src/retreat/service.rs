use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::RetreatModel,
    repository::RetreatRepository,
    types::{CreateRetreatRequest, PaginatedRetreats, UpdateRetreatRequest},
};
use crate::servantee::repository::ServanteeRepository;
use crate::shared::AppError;

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 10;

/// Service for retreat management.
///
/// Owns the cross-entity bookkeeping: attendee lists must reference existing
/// servantees, and each servantee's attended-retreat list follows retreat
/// creation, attendee changes and deletion.
pub struct RetreatService {
    retreats: Arc<dyn RetreatRepository + Send + Sync>,
    servantees: Arc<dyn ServanteeRepository + Send + Sync>,
}

impl RetreatService {
    pub fn new(
        retreats: Arc<dyn RetreatRepository + Send + Sync>,
        servantees: Arc<dyn ServanteeRepository + Send + Sync>,
    ) -> Self {
        Self {
            retreats,
            servantees,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, request: CreateRetreatRequest) -> Result<RetreatModel, AppError> {
        if request.end_date < request.start_date {
            return Err(AppError::Validation(
                "End date cannot be before start date".to_string(),
            ));
        }
        self.ensure_attendees_exist(&request.attendee_ids).await?;

        let retreat = RetreatModel::new(request);
        self.retreats.create_retreat(&retreat).await?;

        for attendee_id in &retreat.attendee_ids {
            self.servantees.add_retreat(attendee_id, &retreat.id).await?;
        }

        info!(retreat_id = %retreat.id, attendees = retreat.attendee_ids.len(), "Retreat created");
        Ok(retreat)
    }

    #[instrument(skip(self))]
    pub async fn find_all(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
        search: Option<String>,
    ) -> Result<PaginatedRetreats, AppError> {
        let page = page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = limit.unwrap_or(DEFAULT_LIMIT).max(1);

        let (data, total) = self
            .retreats
            .list_retreats(page, limit, search.as_deref())
            .await?;

        Ok(PaginatedRetreats {
            data,
            total,
            page,
            limit,
        })
    }

    #[instrument(skip(self))]
    pub async fn find_one(&self, id: &str) -> Result<RetreatModel, AppError> {
        self.retreats
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Retreat with id {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn find_by_servantee(&self, servantee_id: &str) -> Result<Vec<RetreatModel>, AppError> {
        // Reject ids that do not reference a servantee at all
        if self.servantees.find_by_id(servantee_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "Invalid servantee ID: {}",
                servantee_id
            )));
        }
        self.retreats.find_by_servantee(servantee_id).await
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: &str,
        request: UpdateRetreatRequest,
    ) -> Result<RetreatModel, AppError> {
        let mut retreat = self.find_one(id).await?;

        let start_date = request.start_date.unwrap_or(retreat.start_date);
        let end_date = request.end_date.unwrap_or(retreat.end_date);
        if end_date < start_date {
            return Err(AppError::Validation(
                "End date cannot be before start date".to_string(),
            ));
        }

        if let Some(attendee_ids) = &request.attendee_ids {
            self.ensure_attendees_exist(attendee_ids).await?;
            for attendee_id in attendee_ids {
                self.servantees.add_retreat(attendee_id, &retreat.id).await?;
            }
        }

        if let Some(name) = request.name {
            retreat.name = name;
        }
        if let Some(location) = request.location {
            retreat.location = location;
        }
        retreat.start_date = start_date;
        retreat.end_date = end_date;
        if let Some(attendee_ids) = request.attendee_ids {
            retreat.attendee_ids = attendee_ids;
        }
        if let Some(note_ids) = request.note_ids {
            retreat.note_ids = note_ids;
        }
        retreat.updated_at = Utc::now();

        self.retreats.update_retreat(&retreat).await?;

        info!(retreat_id = %retreat.id, "Retreat updated");
        Ok(retreat)
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> Result<RetreatModel, AppError> {
        let retreat = self.find_one(id).await?;

        self.retreats.delete_retreat(id).await?;
        self.servantees.remove_retreat_from_all(id).await?;

        info!(retreat_id = %id, "Retreat deleted");
        Ok(retreat)
    }

    async fn ensure_attendees_exist(&self, attendee_ids: &[String]) -> Result<(), AppError> {
        for attendee_id in attendee_ids {
            if self.servantees.find_by_id(attendee_id).await?.is_none() {
                return Err(AppError::Validation(format!(
                    "Attendee {} not found",
                    attendee_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retreat::repository::InMemoryRetreatRepository;
    use crate::servantee::models::ServanteeModel;
    use crate::servantee::repository::InMemoryServanteeRepository;
    use crate::servantee::types::CreateServanteeRequest;
    use chrono::{Duration, Utc};

    struct Fixture {
        service: RetreatService,
        servantees: Arc<InMemoryServanteeRepository>,
        servantee_id: String,
    }

    /// Service over in-memory repositories with one servantee pre-created
    async fn fixture() -> Fixture {
        let servantees = Arc::new(InMemoryServanteeRepository::new());
        let retreats = Arc::new(InMemoryRetreatRepository::new());

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

        Fixture {
            service: RetreatService::new(retreats, servantees.clone()),
            servantees,
            servantee_id: servantee.id,
        }
    }

    fn create_request(attendee_ids: Vec<String>) -> CreateRetreatRequest {
        let start = Utc::now();
        CreateRetreatRequest {
            name: "Summer Retreat".to_string(),
            location: "Alexandria".to_string(),
            start_date: start,
            end_date: start + Duration::days(3),
            attendee_ids,
            note_ids: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_links_attendees() {
        let fixture = fixture().await;

        let retreat = fixture
            .service
            .create(create_request(vec![fixture.servantee_id.clone()]))
            .await
            .unwrap();

        let servantee = fixture
            .servantees
            .find_by_id(&fixture.servantee_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(servantee.retreat_ids, vec![retreat.id]);
    }

    #[tokio::test]
    async fn test_create_rejects_reversed_dates() {
        let fixture = fixture().await;

        let mut request = create_request(Vec::new());
        request.end_date = request.start_date - Duration::days(1);

        let result = fixture.service.create(request).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_attendee() {
        let fixture = fixture().await;

        let result = fixture
            .service
            .create(create_request(vec!["ghost-id".to_string()]))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_remove_unlinks_attendees() {
        let fixture = fixture().await;

        let retreat = fixture
            .service
            .create(create_request(vec![fixture.servantee_id.clone()]))
            .await
            .unwrap();
        fixture.service.remove(&retreat.id).await.unwrap();

        let servantee = fixture
            .servantees
            .find_by_id(&fixture.servantee_id)
            .await
            .unwrap()
            .unwrap();
        assert!(servantee.retreat_ids.is_empty());
    }

    #[tokio::test]
    async fn test_find_all_defaults_pagination() {
        let fixture = fixture().await;
        fixture.service.create(create_request(Vec::new())).await.unwrap();

        let listing = fixture.service.find_all(None, None, None).await.unwrap();
        assert_eq!(listing.page, 1);
        assert_eq!(listing.limit, 10);
        assert_eq!(listing.total, 1);
        assert_eq!(listing.data.len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_servantee_rejects_unknown_id() {
        let fixture = fixture().await;

        let result = fixture.service.find_by_servantee("ghost-id").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_validates_dates_against_stored_values() {
        let fixture = fixture().await;
        let retreat = fixture.service.create(create_request(Vec::new())).await.unwrap();

        // Moving the end date before the stored start date must fail
        let result = fixture
            .service
            .update(
                &retreat.id,
                UpdateRetreatRequest {
                    end_date: Some(retreat.start_date - Duration::days(1)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
