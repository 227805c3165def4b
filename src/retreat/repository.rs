use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::RetreatModel;
use crate::shared::AppError;

/// Most-recent retreats returned for a single servantee
const RETREATS_PER_SERVANTEE: usize = 5;

/// Trait for retreat repository operations
#[async_trait]
pub trait RetreatRepository {
    async fn create_retreat(&self, retreat: &RetreatModel) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<RetreatModel>, AppError>;
    /// Pages retreats newest-first, optionally filtering name/location by a
    /// case-insensitive substring. Returns the page plus the total count of
    /// matching rows.
    async fn list_retreats(
        &self,
        page: u32,
        limit: u32,
        search: Option<&str>,
    ) -> Result<(Vec<RetreatModel>, u64), AppError>;
    /// A servantee's retreats, newest-first, capped at
    /// `RETREATS_PER_SERVANTEE`.
    async fn find_by_servantee(&self, servantee_id: &str) -> Result<Vec<RetreatModel>, AppError>;
    async fn update_retreat(&self, retreat: &RetreatModel) -> Result<(), AppError>;
    async fn delete_retreat(&self, id: &str) -> Result<(), AppError>;
}

/// In-memory implementation of RetreatRepository for development and testing
pub struct InMemoryRetreatRepository {
    retreats: Mutex<HashMap<String, RetreatModel>>,
}

impl Default for InMemoryRetreatRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRetreatRepository {
    pub fn new() -> Self {
        Self {
            retreats: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_retreats(retreats: Vec<RetreatModel>) -> Self {
        let mut map = HashMap::new();
        for retreat in retreats {
            map.insert(retreat.id.clone(), retreat);
        }

        Self {
            retreats: Mutex::new(map),
        }
    }

    fn matches_search(retreat: &RetreatModel, search: &str) -> bool {
        let needle = search.to_lowercase();
        retreat.name.to_lowercase().contains(&needle)
            || retreat.location.to_lowercase().contains(&needle)
    }
}

#[async_trait]
impl RetreatRepository for InMemoryRetreatRepository {
    #[instrument(skip(self, retreat))]
    async fn create_retreat(&self, retreat: &RetreatModel) -> Result<(), AppError> {
        debug!(retreat_id = %retreat.id, "Creating retreat in memory");

        let mut retreats = self.retreats.lock().unwrap();
        retreats.insert(retreat.id.clone(), retreat.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<RetreatModel>, AppError> {
        let retreats = self.retreats.lock().unwrap();
        Ok(retreats.get(id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_retreats(
        &self,
        page: u32,
        limit: u32,
        search: Option<&str>,
    ) -> Result<(Vec<RetreatModel>, u64), AppError> {
        let retreats = self.retreats.lock().unwrap();

        let mut matching: Vec<RetreatModel> = retreats
            .values()
            .filter(|r| search.map_or(true, |s| Self::matches_search(r, s)))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.start_date.cmp(&a.start_date));

        let total = matching.len() as u64;
        let skip = (page.saturating_sub(1) * limit) as usize;
        let data = matching
            .into_iter()
            .skip(skip)
            .take(limit as usize)
            .collect();

        Ok((data, total))
    }

    #[instrument(skip(self))]
    async fn find_by_servantee(&self, servantee_id: &str) -> Result<Vec<RetreatModel>, AppError> {
        let retreats = self.retreats.lock().unwrap();

        let mut attended: Vec<RetreatModel> = retreats
            .values()
            .filter(|r| r.attendee_ids.iter().any(|a| a == servantee_id))
            .cloned()
            .collect();
        attended.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        attended.truncate(RETREATS_PER_SERVANTEE);

        Ok(attended)
    }

    #[instrument(skip(self, retreat))]
    async fn update_retreat(&self, retreat: &RetreatModel) -> Result<(), AppError> {
        let mut retreats = self.retreats.lock().unwrap();
        if !retreats.contains_key(&retreat.id) {
            return Err(AppError::NotFound(format!(
                "Retreat with id {} not found",
                retreat.id
            )));
        }
        retreats.insert(retreat.id.clone(), retreat.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_retreat(&self, id: &str) -> Result<(), AppError> {
        let mut retreats = self.retreats.lock().unwrap();
        if retreats.remove(id).is_none() {
            return Err(AppError::NotFound(format!(
                "Retreat with id {} not found",
                id
            )));
        }
        Ok(())
    }
}

/// PostgreSQL implementation of the retreat repository
pub struct PostgresRetreatRepository {
    pool: PgPool,
}

impl PostgresRetreatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_retreat(row: &sqlx::postgres::PgRow) -> RetreatModel {
        RetreatModel {
            id: row.get("id"),
            name: row.get("name"),
            location: row.get("location"),
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
            attendee_ids: row.get("attendee_ids"),
            note_ids: row.get("note_ids"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

const RETREAT_COLUMNS: &str =
    "id, name, location, start_date, end_date, attendee_ids, note_ids, created_at, updated_at";

#[async_trait]
impl RetreatRepository for PostgresRetreatRepository {
    #[instrument(skip(self, retreat))]
    async fn create_retreat(&self, retreat: &RetreatModel) -> Result<(), AppError> {
        debug!(retreat_id = %retreat.id, "Creating retreat in database");

        sqlx::query(
            "INSERT INTO retreats (id, name, location, start_date, end_date, attendee_ids, note_ids, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&retreat.id)
        .bind(&retreat.name)
        .bind(&retreat.location)
        .bind(retreat.start_date)
        .bind(retreat.end_date)
        .bind(&retreat.attendee_ids)
        .bind(&retreat.note_ids)
        .bind(retreat.created_at)
        .bind(retreat.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create retreat in database");
            AppError::Database(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<RetreatModel>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM retreats WHERE id = $1",
            RETREAT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, retreat_id = %id, "Failed to fetch retreat");
            AppError::Database(e.to_string())
        })?;

        Ok(row.as_ref().map(Self::row_to_retreat))
    }

    #[instrument(skip(self))]
    async fn list_retreats(
        &self,
        page: u32,
        limit: u32,
        search: Option<&str>,
    ) -> Result<(Vec<RetreatModel>, u64), AppError> {
        let pattern = search.map(|s| format!("%{}%", s));
        let offset = (page.saturating_sub(1) * limit) as i64;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM retreats \
             WHERE $1::text IS NULL OR name ILIKE $1 OR location ILIKE $1 \
             ORDER BY start_date DESC LIMIT $2 OFFSET $3",
            RETREAT_COLUMNS
        ))
        .bind(&pattern)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list retreats");
            AppError::Database(e.to_string())
        })?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM retreats \
             WHERE $1::text IS NULL OR name ILIKE $1 OR location ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to count retreats");
            AppError::Database(e.to_string())
        })?;

        Ok((
            rows.iter().map(Self::row_to_retreat).collect(),
            total as u64,
        ))
    }

    #[instrument(skip(self))]
    async fn find_by_servantee(&self, servantee_id: &str) -> Result<Vec<RetreatModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM retreats WHERE $1 = ANY(attendee_ids) \
             ORDER BY start_date DESC LIMIT $2",
            RETREAT_COLUMNS
        ))
        .bind(servantee_id)
        .bind(RETREATS_PER_SERVANTEE as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, servantee_id = %servantee_id, "Failed to fetch retreats for servantee");
            AppError::Database(e.to_string())
        })?;

        Ok(rows.iter().map(Self::row_to_retreat).collect())
    }

    #[instrument(skip(self, retreat))]
    async fn update_retreat(&self, retreat: &RetreatModel) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE retreats SET name = $2, location = $3, start_date = $4, end_date = $5, \
             attendee_ids = $6, note_ids = $7, updated_at = $8 WHERE id = $1",
        )
        .bind(&retreat.id)
        .bind(&retreat.name)
        .bind(&retreat.location)
        .bind(retreat.start_date)
        .bind(retreat.end_date)
        .bind(&retreat.attendee_ids)
        .bind(&retreat.note_ids)
        .bind(retreat.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, retreat_id = %retreat.id, "Failed to update retreat");
            AppError::Database(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Retreat with id {} not found",
                retreat.id
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_retreat(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM retreats WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, retreat_id = %id, "Failed to delete retreat");
                AppError::Database(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Retreat with id {} not found",
                id
            )));
        }
        Ok(())
    }
}
