use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::{create_token, hash_password, validate_token, verify_password, Claims};
use crate::config::AuthConfig;
use crate::error::{AppError, Result};
use crate::repositories::users::DUPLICATE_EMAIL;
use crate::repositories::{NewUser, User, UserStore};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, config: AuthConfig) -> Self {
        Self { users, config }
    }

    pub fn required(&self) -> bool {
        self.config.required
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "name, email and password required".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(AppError::Validation("Invalid email address".to_string()));
        }

        if self.users.find_by_email(email).await?.is_some() {
            return Err(AppError::Validation(DUPLICATE_EMAIL.to_string()));
        }

        let password_hash = self.hash(password).await?;
        let user = self
            .users
            .create(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken> {
        let user = self
            .users
            .find_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !self.verify(password, &user.password_hash).await? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let token = create_token(
            user.id,
            &user.email,
            &self.config.jwt_secret,
            self.config.jwt_expiry_hours,
        )?;

        let expires_in = self
            .config
            .jwt_expiry_hours
            .checked_mul(3600)
            .ok_or_else(|| AppError::Internal("Token lifetime out of range".to_string()))?;

        Ok(IssuedToken { token, expires_in })
    }

    pub fn authenticate(&self, token: &str) -> Result<Claims> {
        validate_token(token, &self.config.jwt_secret)
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<User> {
        self.users
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))
    }

    // bcrypt is CPU bound; keep it off the async workers.
    async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let cost = self.config.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MemoryStore;

    fn service() -> AuthService {
        service_with_expiry(1)
    }

    fn service_with_expiry(jwt_expiry_hours: u64) -> AuthService {
        AuthService::new(
            Arc::new(MemoryStore::new()),
            AuthConfig {
                jwt_secret: "test-secret".to_string(),
                jwt_expiry_hours,
                bcrypt_cost: 4,
                required: true,
            },
        )
    }

    #[tokio::test]
    async fn test_signup_then_login_issues_token_for_user() {
        let auth = service();
        let user = auth
            .signup("Asha", "asha@example.com", "hunter22")
            .await
            .unwrap();
        assert_ne!(user.password_hash, "hunter22");

        let issued = auth.login("asha@example.com", "hunter22").await.unwrap();
        assert_eq!(issued.expires_in, 3600);

        let claims = auth.authenticate(&issued.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(auth.current_user(user.id).await.unwrap().email, user.email);
    }

    #[tokio::test]
    async fn test_duplicate_signup_is_rejected() {
        let auth = service();
        auth.signup("Asha", "asha@example.com", "pw").await.unwrap();
        let err = auth
            .signup("Other", "Asha@Example.com", "pw2")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Email already registered"));
    }

    #[tokio::test]
    async fn test_signup_requires_fields() {
        let auth = service();
        assert!(matches!(
            auth.signup(" ", "a@b.c", "pw").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            auth.signup("Name", "not-an-email", "pw").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            auth.signup("Name", "a@b.c", "").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let auth = service();
        auth.signup("Asha", "asha@example.com", "right").await.unwrap();

        let wrong_password = auth.login("asha@example.com", "wrong").await.unwrap_err();
        let unknown_user = auth.login("nobody@example.com", "right").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(wrong_password, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_oversized_token_lifetime_fails_login_cleanly() {
        let auth = service_with_expiry(10_000_000_000_000_000);
        auth.signup("Asha", "asha@example.com", "right").await.unwrap();

        let err = auth.login("asha@example.com", "right").await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
