use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{Role, UserModel};
use crate::shared::AppError;

/// Trait for user (credential store) repository operations
#[async_trait]
pub trait UserRepository {
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<UserModel>, AppError>;
    /// Case-folded email lookup, returning the full row including hashes.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError>;
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError>;
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError>;
    async fn delete_user(&self, id: &str) -> Result<(), AppError>;
    /// Overwrites the stored refresh-token fingerprint (rotation). Any
    /// previously issued refresh token stops matching from here on.
    async fn set_refresh_token_hash(&self, id: &str, hash: &str) -> Result<(), AppError>;
    /// Clears the fingerprint so no refresh token is accepted (logout).
    async fn clear_refresh_token_hash(&self, id: &str) -> Result<(), AppError>;
}

/// In-memory implementation of UserRepository for development and testing
///
/// This provides a realistic implementation that can be used in development
/// without requiring a real database connection. Data is stored in memory
/// and will be lost when the application restarts.
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, UserModel>>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an in-memory repository with pre-populated users
    pub fn with_users(users: Vec<UserModel>) -> Self {
        let mut user_map = HashMap::new();
        for user in users {
            user_map.insert(user.id.clone(), user);
        }

        Self {
            users: Mutex::new(user_map),
        }
    }

    /// Returns the current number of users in the repository
    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(user_id = %user.id, email = %user.email, "Creating user in memory");

        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            warn!(email = %user.email, "Email already registered");
            return Err(AppError::EmailExists(user.email.clone()));
        }
        users.insert(user.id.clone(), user.clone());

        debug!(user_id = %user.id, "User created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<UserModel>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.get(id).cloned())
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let folded = email.to_lowercase();
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == folded).cloned())
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError> {
        let users = self.users.lock().unwrap();
        let mut all: Vec<UserModel> = users.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }

    #[instrument(skip(self, user))]
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if !users.contains_key(&user.id) {
            warn!(user_id = %user.id, "User not found for update in memory");
            return Err(AppError::NotFound(format!(
                "User with id {} not found",
                user.id
            )));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if users.remove(id).is_none() {
            warn!(user_id = %id, "User not found for deletion in memory");
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    #[instrument(skip(self, hash))]
    async fn set_refresh_token_hash(&self, id: &str, hash: &str) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(id).ok_or_else(|| {
            warn!(user_id = %id, "User not found for refresh-token rotation");
            AppError::NotFound(format!("User with id {} not found", id))
        })?;
        user.refresh_token_hash = Some(hash.to_string());
        user.updated_at = Utc::now();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_refresh_token_hash(&self, id: &str) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(id).ok_or_else(|| {
            warn!(user_id = %id, "User not found for refresh-token clear");
            AppError::NotFound(format!("User with id {} not found", id))
        })?;
        user.refresh_token_hash = None;
        user.updated_at = Utc::now();
        Ok(())
    }
}

/// PostgreSQL implementation of the user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &sqlx::postgres::PgRow) -> Result<UserModel, AppError> {
        Ok(UserModel {
            id: row.get("id"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            role: Role::parse(row.get::<String, _>("role").as_str())?,
            refresh_token_hash: row.get("refresh_token_hash"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(user_id = %user.id, email = %user.email, "Creating user in database");

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, role, refresh_token_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.refresh_token_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                warn!(email = %user.email, "Email already registered");
                return AppError::EmailExists(user.email.clone());
            }
            warn!(error = %e, "Failed to create user in database");
            AppError::Database(e.to_string())
        })?;

        debug!(user_id = %user.id, "User created successfully in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, role, refresh_token_hash, created_at, updated_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %id, "Failed to fetch user from database");
            AppError::Database(e.to_string())
        })?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, role, refresh_token_hash, created_at, updated_at \
             FROM users WHERE email = $1",
        )
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch user by email from database");
            AppError::Database(e.to_string())
        })?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError> {
        let rows = sqlx::query(
            "SELECT id, email, password_hash, role, refresh_token_hash, created_at, updated_at \
             FROM users ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list users from database");
            AppError::Database(e.to_string())
        })?;

        rows.iter().map(Self::row_to_user).collect()
    }

    #[instrument(skip(self, user))]
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET email = $2, password_hash = $3, role = $4, \
             refresh_token_hash = $5, updated_at = $6 WHERE id = $1",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.refresh_token_hash)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                return AppError::EmailExists(user.email.clone());
            }
            warn!(error = %e, user_id = %user.id, "Failed to update user in database");
            AppError::Database(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!(user_id = %user.id, "User not found for update");
            return Err(AppError::NotFound(format!(
                "User with id {} not found",
                user.id
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, user_id = %id, "Failed to delete user from database");
                AppError::Database(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    #[instrument(skip(self, hash))]
    async fn set_refresh_token_hash(&self, id: &str, hash: &str) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE users SET refresh_token_hash = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(hash)
                .bind(Utc::now())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    warn!(error = %e, user_id = %id, "Failed to rotate refresh-token hash");
                    AppError::Database(e.to_string())
                })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_refresh_token_hash(&self, id: &str) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE users SET refresh_token_hash = NULL, updated_at = $2 WHERE id = $1")
                .bind(id)
                .bind(Utc::now())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    warn!(error = %e, user_id = %id, "Failed to clear refresh-token hash");
                    AppError::Database(e.to_string())
                })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }
}
