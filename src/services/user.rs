//! User service
//!
//! Registration, login/logout and session management. A session token is
//! the `session` cookie value; expired sessions count as logged out and are
//! deleted when seen.

use anyhow::Context;
use chrono::Duration;
use std::sync::Arc;

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::forms::SignupForm;
use crate::models::{Session, User};
use crate::services::password::{hash_password, verify_password};

/// Default session lifetime in days
pub const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Shown on the login form for any credential mismatch
pub const INVALID_CREDENTIALS: &str = "Пожалуйста, введите правильные имя пользователя и пароль. \
     Оба поля могут быть чувствительны к регистру.";

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Invalid credentials
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Signup form rejected; it carries its field errors
    #[error("Invalid signup form")]
    Validation(SignupForm),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_ttl: Duration,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self::with_session_expiration(user_repo, session_repo, DEFAULT_SESSION_EXPIRATION_DAYS)
    }

    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_ttl: Duration::try_days(session_expiration_days).unwrap_or(Duration::MAX),
        }
    }

    /// Create an account from a signup form
    pub async fn register(&self, mut form: SignupForm) -> Result<User, UserServiceError> {
        if !form.validate() {
            return Err(UserServiceError::Validation(form));
        }

        if self
            .user_repo
            .get_by_username(&form.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            form.errors
                .add("username", "Пользователь с таким именем уже существует.");
            return Err(UserServiceError::Validation(form));
        }

        let password_hash = hash_password(&form.password1).context("Failed to hash password")?;
        let user = self
            .user_repo
            .create(&User::new(form.username, password_hash))
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check credentials and open a new session
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(username.trim())
            .await
            .context("Failed to look up user")?
            .ok_or_else(|| {
                tracing::debug!(username, "Login failed: unknown user");
                UserServiceError::AuthenticationError(INVALID_CREDENTIALS.to_string())
            })?;

        let password_valid =
            verify_password(password, &user.password_hash).context("Failed to verify password")?;
        if !password_valid {
            tracing::debug!(user_id = user.id, "Login failed: wrong password");
            return Err(UserServiceError::AuthenticationError(
                INVALID_CREDENTIALS.to_string(),
            ));
        }

        let session = self.start_session(user.id).await?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok(session)
    }

    /// Open a session for a known user without checking a password
    pub async fn start_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let session = self
            .session_repo
            .create(&Session::start(user_id, self.session_ttl))
            .await
            .context("Failed to create session")?;
        Ok(session)
    }

    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        tracing::debug!("Session closed");
        Ok(())
    }

    /// The user behind a session token, or `None` for unknown or expired tokens
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to load session")?
        {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired() {
            self.session_repo
                .delete(&session.id)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        self.get_by_id(session.user_id).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;
        Ok(user)
    }

    /// Remove every expired session. Returns how many were deleted.
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let removed = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup_with_ttl(days: i64) -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        UserService::with_session_expiration(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
            days,
        )
    }

    async fn setup() -> UserService {
        setup_with_ttl(DEFAULT_SESSION_EXPIRATION_DAYS).await
    }

    fn signup(username: &str) -> SignupForm {
        SignupForm::new(username, "s3cret-pass", "s3cret-pass")
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let service = setup().await;

        let user = service.register(signup("Автор")).await.unwrap();
        assert!(user.id > 0);
        assert_ne!(user.password_hash, "s3cret-pass");

        let session = service.login("Автор", "s3cret-pass").await.unwrap();
        let current = service.validate_session(&session.id).await.unwrap().unwrap();
        assert_eq!(current.id, user.id);
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let service = setup().await;
        service.register(signup("Автор")).await.unwrap();

        match service.register(signup("Автор")).await {
            Err(UserServiceError::Validation(form)) => {
                assert_eq!(form.errors.field("username").len(), 1);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_form() {
        let service = setup().await;
        let result = service
            .register(SignupForm::new("", "one", "two"))
            .await;
        assert!(matches!(result, Err(UserServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let service = setup().await;
        service.register(signup("Автор")).await.unwrap();

        let result = service.login("Автор", "wrong").await;
        assert!(matches!(result, Err(UserServiceError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let service = setup().await;
        let result = service.login("nobody", "whatever").await;
        assert!(matches!(result, Err(UserServiceError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let service = setup().await;
        let user = service.register(signup("Автор")).await.unwrap();
        let session = service.start_session(user.id).await.unwrap();

        service.logout(&session.id).await.unwrap();

        assert!(service.validate_session(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_token_is_anonymous() {
        let service = setup().await;
        assert!(service.validate_session("no-such-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_rejected_and_swept() {
        let service = setup_with_ttl(-1).await;
        let user = service.register(signup("Автор")).await.unwrap();
        let first = service.start_session(user.id).await.unwrap();
        service.start_session(user.id).await.unwrap();

        assert!(service.validate_session(&first.id).await.unwrap().is_none());
        // The first one was already removed on lookup
        assert_eq!(service.cleanup_expired_sessions().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_oversized_ttl_does_not_overflow() {
        let service = setup_with_ttl(i64::MAX).await;
        let user = service.register(signup("Автор")).await.unwrap();
        let session = service.start_session(user.id).await.unwrap();

        assert!(!session.is_expired());
        assert!(session.expires_at > chrono::Utc::now() + Duration::days(3650));
    }
}
