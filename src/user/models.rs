use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::AppError;

/// Coarse permission class gating endpoint access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Servant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Servant => "Servant",
        }
    }

    /// Parses a stored role string. Unknown values are a validation error
    /// rather than a panic so corrupted rows surface cleanly.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "Admin" => Ok(Role::Admin),
            "Servant" => Ok(Role::Servant),
            other => Err(AppError::Validation(format!(
                "Invalid role: {}. Role must be either 'Admin' or 'Servant'",
                other
            ))),
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Servant
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database model for the users table.
///
/// Deliberately not `Serialize`: password and refresh-token hashes must never
/// reach a response body. Handlers convert to `UserResponse` instead.
#[derive(Debug, Clone)]
pub struct UserModel {
    pub id: String, // UUID v4 as string
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    /// Fingerprint of the single currently-valid refresh token, if any.
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserModel {
    /// Creates a new user model with a generated ID and timestamps.
    /// Email is case-folded here so uniqueness is case-insensitive.
    pub fn new(email: &str, password_hash: String, role: Role) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_lowercase(),
            password_hash,
            role,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        }
    }
}
