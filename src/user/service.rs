use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::UserModel,
    repository::UserRepository,
    types::{CreateUserRequest, UpdateUserRequest, UserResponse},
};
use crate::auth::password;
use crate::shared::AppError;

/// Service for user account management.
///
/// Enforces the password strength policy and case-insensitive email
/// uniqueness; the same create path backs both admin creation and
/// self-registration.
pub struct UserService {
    repository: Arc<dyn UserRepository + Send + Sync>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, request: CreateUserRequest) -> Result<UserResponse, AppError> {
        if !password::meets_policy(&request.password) {
            return Err(AppError::WeakPassword);
        }

        let email = request.email.to_lowercase();
        if self.repository.find_by_email(&email).await?.is_some() {
            return Err(AppError::EmailExists(email));
        }

        let password_hash = password::hash(&request.password)?;
        let user = UserModel::new(&email, password_hash, request.role);
        self.repository.create_user(&user).await?;

        info!(user_id = %user.id, role = %user.role, "User created");
        Ok(UserResponse::from(user))
    }

    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<UserResponse>, AppError> {
        let users = self.repository.list_users().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn find_one(&self, id: &str) -> Result<UserResponse, AppError> {
        let user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;
        Ok(UserResponse::from(user))
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: &str,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, AppError> {
        let mut user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        if let Some(email) = request.email {
            let email = email.to_lowercase();
            // The address may only collide with a different user's row
            if let Some(existing) = self.repository.find_by_email(&email).await? {
                if existing.id != user.id {
                    return Err(AppError::EmailExists(email));
                }
            }
            user.email = email;
        }

        if let Some(new_password) = request.password {
            if !password::meets_policy(&new_password) {
                return Err(AppError::WeakPassword);
            }
            user.password_hash = password::hash(&new_password)?;
        }

        if let Some(role) = request.role {
            user.role = role;
        }

        user.updated_at = Utc::now();
        self.repository.update_user(&user).await?;

        info!(user_id = %user.id, "User updated");
        Ok(UserResponse::from(user))
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> Result<UserResponse, AppError> {
        let user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        self.repository.delete_user(id).await?;

        info!(user_id = %id, "User deleted");
        Ok(UserResponse::from(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::models::Role;
    use crate::user::repository::InMemoryUserRepository;

    fn service() -> UserService {
        UserService::new(Arc::new(InMemoryUserRepository::new()))
    }

    fn create_request(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            password: "Passw0rd!".to_string(),
            role: Role::Servant,
        }
    }

    #[tokio::test]
    async fn test_create_user() {
        let service = service();
        let created = service.create(create_request("Alice@X.com")).await.unwrap();

        assert_eq!(created.email, "alice@x.com");
        assert_eq!(created.role, Role::Servant);
        assert!(!created.id.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_weak_password() {
        let service = service();
        let mut request = create_request("alice@x.com");
        request.password = "short".to_string();

        let result = service.create(request).await;
        assert!(matches!(result, Err(AppError::WeakPassword)));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let service = service();
        service.create(create_request("alice@x.com")).await.unwrap();

        let result = service.create(create_request("ALICE@x.com")).await;
        assert!(matches!(result, Err(AppError::EmailExists(_))));
    }

    #[tokio::test]
    async fn test_update_email_collision_with_other_user() {
        let service = service();
        service.create(create_request("alice@x.com")).await.unwrap();
        let bob = service.create(create_request("bob@x.com")).await.unwrap();

        let result = service
            .update(
                &bob.id,
                UpdateUserRequest {
                    email: Some("alice@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::EmailExists(_))));
    }

    #[tokio::test]
    async fn test_update_own_email_to_same_value_is_allowed() {
        let service = service();
        let alice = service.create(create_request("alice@x.com")).await.unwrap();

        let updated = service
            .update(
                &alice.id,
                UpdateUserRequest {
                    email: Some("Alice@X.com".to_string()),
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email, "alice@x.com");
        assert_eq!(updated.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_remove_missing_user() {
        let service = service();
        let result = service.remove("no-such-id").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
