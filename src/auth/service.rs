use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    password,
    token::TokenConfig,
    types::{LoginResponse, RegisterResponse, TokenPair},
};
use crate::shared::AppError;
use crate::user::{
    repository::UserRepository,
    service::UserService,
    types::{CreateUserRequest, UserResponse},
};

/// Session manager: orchestrates login, refresh and logout over the
/// credential store and the token issuer.
///
/// A user's session moves Anonymous -> Authenticated -> (Refreshed)* ->
/// LoggedOut; the only persisted state is the fingerprint of the single
/// currently-valid refresh token on the user row.
pub struct AuthService {
    users: Arc<dyn UserRepository + Send + Sync>,
    tokens: TokenConfig,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository + Send + Sync>, tokens: TokenConfig) -> Self {
        Self { users, tokens }
    }

    /// Registers a new account. Strength policy and email uniqueness are
    /// enforced by the user service before anything is persisted.
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: CreateUserRequest) -> Result<RegisterResponse, AppError> {
        let user = UserService::new(Arc::clone(&self.users))
            .create(request)
            .await?;

        info!(user_id = %user.id, "User registered");
        Ok(RegisterResponse {
            id: user.id,
            email: user.email,
            role: user.role,
        })
    }

    /// Validates credentials and opens a session.
    ///
    /// "No such user" and "wrong password" are indistinguishable from the
    /// outside; both come back as `InvalidCredentials`.
    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !password::verify(password, &user.password_hash) {
            warn!(user_id = %user.id, "Password mismatch at login");
            return Err(AppError::InvalidCredentials);
        }

        let pair = self.tokens.issue_pair(&user.id, &user.email, user.role)?;
        self.rotate_refresh_fingerprint(&user.id, &pair.refresh_token)
            .await?;

        info!(user_id = %user.id, role = %user.role, "Login successful");
        Ok(LoginResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            role: user.role,
        })
    }

    /// Exchanges a refresh token for a new pair, rotating the stored
    /// fingerprint so the presented token becomes permanently unusable.
    ///
    /// Every failure mode (bad signature, expiry, unknown subject, never
    /// logged in, rotated out, logged out) collapses into
    /// `InvalidRefreshToken`. Replay of a rotated-out token is rejected here;
    /// escalating that detection into whole-session invalidation is left as
    /// a hardening followup.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = self.tokens.verify_refresh(refresh_token)?;

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or(AppError::InvalidRefreshToken)?;

        let stored = user
            .refresh_token_hash
            .as_deref()
            .ok_or(AppError::InvalidRefreshToken)?;
        if !password::verify(refresh_token, stored) {
            warn!(user_id = %user.id, "Presented refresh token does not match stored fingerprint");
            return Err(AppError::InvalidRefreshToken);
        }

        let pair = self.tokens.issue_pair(&user.id, &user.email, user.role)?;
        self.rotate_refresh_fingerprint(&user.id, &pair.refresh_token)
            .await?;

        info!(user_id = %user.id, "Refresh token rotated");
        Ok(pair)
    }

    /// Clears the stored fingerprint: all outstanding refresh tokens die
    /// immediately. Already-issued access tokens stay valid until natural
    /// expiry.
    #[instrument(skip(self))]
    pub async fn logout(&self, user_id: &str) -> Result<(), AppError> {
        self.users.clear_refresh_token_hash(user_id).await?;
        info!(user_id = %user_id, "Logged out");
        Ok(())
    }

    /// Returns the caller's own record.
    #[instrument(skip(self))]
    pub async fn profile(&self, user_id: &str) -> Result<UserResponse, AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;
        Ok(UserResponse::from(user))
    }

    async fn rotate_refresh_fingerprint(
        &self,
        user_id: &str,
        refresh_token: &str,
    ) -> Result<(), AppError> {
        let fingerprint = password::hash(refresh_token)?;
        self.users
            .set_refresh_token_hash(user_id, &fingerprint)
            .await
    }
}
