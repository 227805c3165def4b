use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::ServanteeModel;
use crate::shared::AppError;

/// Trait for servantee repository operations
#[async_trait]
pub trait ServanteeRepository {
    async fn create_servantee(&self, servantee: &ServanteeModel) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<ServanteeModel>, AppError>;
    async fn find_by_phone(&self, phone: &str) -> Result<Option<ServanteeModel>, AppError>;
    async fn list_servantees(&self) -> Result<Vec<ServanteeModel>, AppError>;
    async fn update_servantee(&self, servantee: &ServanteeModel) -> Result<(), AppError>;
    async fn delete_servantee(&self, id: &str) -> Result<(), AppError>;
    /// Records retreat attendance; a no-op when already recorded.
    async fn add_retreat(&self, servantee_id: &str, retreat_id: &str) -> Result<(), AppError>;
    /// Removes a deleted retreat from every servantee that attended it.
    async fn remove_retreat_from_all(&self, retreat_id: &str) -> Result<(), AppError>;
}

/// In-memory implementation of ServanteeRepository for development and testing
pub struct InMemoryServanteeRepository {
    servantees: Mutex<HashMap<String, ServanteeModel>>,
}

impl Default for InMemoryServanteeRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryServanteeRepository {
    pub fn new() -> Self {
        Self {
            servantees: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_servantees(servantees: Vec<ServanteeModel>) -> Self {
        let mut map = HashMap::new();
        for servantee in servantees {
            map.insert(servantee.id.clone(), servantee);
        }

        Self {
            servantees: Mutex::new(map),
        }
    }
}

#[async_trait]
impl ServanteeRepository for InMemoryServanteeRepository {
    #[instrument(skip(self, servantee))]
    async fn create_servantee(&self, servantee: &ServanteeModel) -> Result<(), AppError> {
        debug!(servantee_id = %servantee.id, "Creating servantee in memory");

        let mut servantees = self.servantees.lock().unwrap();
        if servantees.values().any(|s| s.phone == servantee.phone) {
            warn!(phone = %servantee.phone, "Phone already registered");
            return Err(AppError::PhoneExists(servantee.phone.clone()));
        }
        servantees.insert(servantee.id.clone(), servantee.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<ServanteeModel>, AppError> {
        let servantees = self.servantees.lock().unwrap();
        Ok(servantees.get(id).cloned())
    }

    #[instrument(skip(self, phone))]
    async fn find_by_phone(&self, phone: &str) -> Result<Option<ServanteeModel>, AppError> {
        let servantees = self.servantees.lock().unwrap();
        Ok(servantees.values().find(|s| s.phone == phone).cloned())
    }

    #[instrument(skip(self))]
    async fn list_servantees(&self) -> Result<Vec<ServanteeModel>, AppError> {
        let servantees = self.servantees.lock().unwrap();
        let mut all: Vec<ServanteeModel> = servantees.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }

    #[instrument(skip(self, servantee))]
    async fn update_servantee(&self, servantee: &ServanteeModel) -> Result<(), AppError> {
        let mut servantees = self.servantees.lock().unwrap();
        if !servantees.contains_key(&servantee.id) {
            return Err(AppError::NotFound(format!(
                "Servantee with id {} not found",
                servantee.id
            )));
        }
        servantees.insert(servantee.id.clone(), servantee.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_servantee(&self, id: &str) -> Result<(), AppError> {
        let mut servantees = self.servantees.lock().unwrap();
        if servantees.remove(id).is_none() {
            return Err(AppError::NotFound(format!(
                "Servantee with id {} not found",
                id
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_retreat(&self, servantee_id: &str, retreat_id: &str) -> Result<(), AppError> {
        let mut servantees = self.servantees.lock().unwrap();
        let servantee = servantees.get_mut(servantee_id).ok_or_else(|| {
            AppError::NotFound(format!("Servantee with id {} not found", servantee_id))
        })?;

        if !servantee.retreat_ids.iter().any(|r| r == retreat_id) {
            servantee.retreat_ids.push(retreat_id.to_string());
            servantee.updated_at = Utc::now();
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_retreat_from_all(&self, retreat_id: &str) -> Result<(), AppError> {
        let mut servantees = self.servantees.lock().unwrap();
        for servantee in servantees.values_mut() {
            if servantee.retreat_ids.iter().any(|r| r == retreat_id) {
                servantee.retreat_ids.retain(|r| r != retreat_id);
                servantee.updated_at = Utc::now();
            }
        }
        Ok(())
    }
}

/// PostgreSQL implementation of the servantee repository
pub struct PostgresServanteeRepository {
    pool: PgPool,
}

impl PostgresServanteeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_servantee(row: &sqlx::postgres::PgRow) -> ServanteeModel {
        ServanteeModel {
            id: row.get("id"),
            phone: row.get("phone"),
            name: row.get("name"),
            birth_date: row.get("birth_date"),
            education: row.get("education"),
            year: row.get("year"),
            church: row.get("church"),
            retreat_dates: row.get("retreat_dates"),
            note_ids: row.get("note_ids"),
            retreat_ids: row.get("retreat_ids"),
            is_active: row.get("is_active"),
            created_by: row.get("created_by"),
            updated_by: row.get("updated_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

const SERVANTEE_COLUMNS: &str = "id, phone, name, birth_date, education, year, church, \
     retreat_dates, note_ids, retreat_ids, is_active, created_by, updated_by, created_at, updated_at";

#[async_trait]
impl ServanteeRepository for PostgresServanteeRepository {
    #[instrument(skip(self, servantee))]
    async fn create_servantee(&self, servantee: &ServanteeModel) -> Result<(), AppError> {
        debug!(servantee_id = %servantee.id, "Creating servantee in database");

        sqlx::query(
            "INSERT INTO servantees (id, phone, name, birth_date, education, year, church, \
             retreat_dates, note_ids, retreat_ids, is_active, created_by, updated_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(&servantee.id)
        .bind(&servantee.phone)
        .bind(&servantee.name)
        .bind(servantee.birth_date)
        .bind(&servantee.education)
        .bind(&servantee.year)
        .bind(&servantee.church)
        .bind(&servantee.retreat_dates)
        .bind(&servantee.note_ids)
        .bind(&servantee.retreat_ids)
        .bind(servantee.is_active)
        .bind(&servantee.created_by)
        .bind(&servantee.updated_by)
        .bind(servantee.created_at)
        .bind(servantee.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                return AppError::PhoneExists(servantee.phone.clone());
            }
            warn!(error = %e, "Failed to create servantee in database");
            AppError::Database(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<ServanteeModel>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM servantees WHERE id = $1",
            SERVANTEE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, servantee_id = %id, "Failed to fetch servantee");
            AppError::Database(e.to_string())
        })?;

        Ok(row.as_ref().map(Self::row_to_servantee))
    }

    #[instrument(skip(self, phone))]
    async fn find_by_phone(&self, phone: &str) -> Result<Option<ServanteeModel>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM servantees WHERE phone = $1",
            SERVANTEE_COLUMNS
        ))
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch servantee by phone");
            AppError::Database(e.to_string())
        })?;

        Ok(row.as_ref().map(Self::row_to_servantee))
    }

    #[instrument(skip(self))]
    async fn list_servantees(&self) -> Result<Vec<ServanteeModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM servantees ORDER BY created_at",
            SERVANTEE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list servantees");
            AppError::Database(e.to_string())
        })?;

        Ok(rows.iter().map(Self::row_to_servantee).collect())
    }

    #[instrument(skip(self, servantee))]
    async fn update_servantee(&self, servantee: &ServanteeModel) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE servantees SET phone = $2, name = $3, birth_date = $4, education = $5, \
             year = $6, church = $7, retreat_dates = $8, note_ids = $9, retreat_ids = $10, \
             is_active = $11, updated_by = $12, updated_at = $13 WHERE id = $1",
        )
        .bind(&servantee.id)
        .bind(&servantee.phone)
        .bind(&servantee.name)
        .bind(servantee.birth_date)
        .bind(&servantee.education)
        .bind(&servantee.year)
        .bind(&servantee.church)
        .bind(&servantee.retreat_dates)
        .bind(&servantee.note_ids)
        .bind(&servantee.retreat_ids)
        .bind(servantee.is_active)
        .bind(&servantee.updated_by)
        .bind(servantee.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                return AppError::PhoneExists(servantee.phone.clone());
            }
            warn!(error = %e, servantee_id = %servantee.id, "Failed to update servantee");
            AppError::Database(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Servantee with id {} not found",
                servantee.id
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_servantee(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM servantees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, servantee_id = %id, "Failed to delete servantee");
                AppError::Database(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Servantee with id {} not found",
                id
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_retreat(&self, servantee_id: &str, retreat_id: &str) -> Result<(), AppError> {
        // Append-if-absent, so re-linking an attendee stays idempotent
        sqlx::query(
            "UPDATE servantees SET retreat_ids = array_append(retreat_ids, $2), updated_at = $3 \
             WHERE id = $1 AND NOT ($2 = ANY(retreat_ids))",
        )
        .bind(servantee_id)
        .bind(retreat_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, servantee_id = %servantee_id, "Failed to record retreat attendance");
            AppError::Database(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_retreat_from_all(&self, retreat_id: &str) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE servantees SET retreat_ids = array_remove(retreat_ids, $1), updated_at = $2 \
             WHERE $1 = ANY(retreat_ids)",
        )
        .bind(retreat_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, retreat_id = %retreat_id, "Failed to unlink deleted retreat");
            AppError::Database(e.to_string())
        })?;

        Ok(())
    }
}
