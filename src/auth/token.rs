use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};

use super::types::{AccessClaims, RefreshClaims, TokenPair};
use crate::shared::AppError;
use crate::user::models::Role;

/// Configuration for JWT token operations.
///
/// Access and refresh tokens are signed with distinct secrets: compromise of
/// the access secret must not permit forging long-lived refresh tokens, and
/// vice versa.
#[derive(Clone)]
pub struct TokenConfig {
    access_secret: String,
    refresh_secret: String,
    pub access_minutes: i64,
    pub refresh_days: i64,
}

impl TokenConfig {
    pub fn new() -> Self {
        // Allow configuring lifetimes via env vars, default to 15 minutes / 7 days
        let access_minutes = std::env::var("ACCESS_TOKEN_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(15);
        let refresh_days = std::env::var("REFRESH_TOKEN_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(7);

        Self {
            access_secret: std::env::var("JWT_ACCESS_SECRET")
                .unwrap_or_else(|_| "access-secret-change-in-production".to_string()),
            refresh_secret: std::env::var("JWT_REFRESH_SECRET")
                .unwrap_or_else(|_| "refresh-secret-change-in-production".to_string()),
            access_minutes,
            refresh_days,
        }
    }

    /// Fixed secrets and default lifetimes, independent of the environment.
    pub fn for_tests() -> Self {
        Self {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_minutes: 15,
            refresh_days: 7,
        }
    }

    /// Mints an access/refresh pair bound to the given identity.
    ///
    /// The access token carries subject, email and role; the refresh token
    /// carries the subject only.
    #[instrument(skip(self, user_id, email))]
    pub fn issue_pair(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
    ) -> Result<TokenPair, AppError> {
        let now = Utc::now();

        let access_claims = AccessClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            exp: (now + Duration::minutes(self.access_minutes)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        let access_token = encode(
            &Header::default(),
            &access_claims,
            &EncodingKey::from_secret(self.access_secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode access token");
            AppError::Internal
        })?;

        let refresh_claims = RefreshClaims {
            sub: user_id.to_string(),
            exp: (now + Duration::days(self.refresh_days)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        let refresh_token = encode(
            &Header::default(),
            &refresh_claims,
            &EncodingKey::from_secret(self.refresh_secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode refresh token");
            AppError::Internal
        })?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Validates an access token and returns its claims.
    #[instrument(skip(self, token))]
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.access_secret.as_ref()),
            &Self::strict_validation(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "Access token rejected");
            AppError::Unauthorized("Invalid or expired access token".to_string())
        })
    }

    /// Validates a refresh token's signature and expiry. The stored-hash
    /// check happens in the session layer, not here.
    #[instrument(skip(self, token))]
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AppError> {
        decode::<RefreshClaims>(
            token,
            &DecodingKey::from_secret(self.refresh_secret.as_ref()),
            &Self::strict_validation(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "Refresh token rejected");
            AppError::InvalidRefreshToken
        })
    }

    // Zero leeway: a token presented one second past expiry is rejected.
    fn strict_validation() -> Validation {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new()
    }
}
