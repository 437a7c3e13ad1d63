//! Signup, login and bearer sessions

use crate::config::AccountsConfig;
use crate::error::{AppError, Result};
use crate::metrics::ACCOUNT_EVENTS_TOTAL;
use crate::models::{Session, UserProfile};
use crate::state::HealthStore;
use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    /// Letters, digits and `@ . + - _`
    static ref USERNAME_PATTERN: Regex =
        Regex::new(r"^[\w.@+-]+$").expect("username pattern is valid");
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 150))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Hex SHA-256 of the salt followed by the password
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify_password(user: &UserProfile, password: &str) -> bool {
    hash_password(&user.salt, password) == user.password_hash
}

/// Account lifecycle on top of the store
pub struct AccountService {
    store: Arc<dyn HealthStore>,
    config: AccountsConfig,
}

impl AccountService {
    pub fn new(store: Arc<dyn HealthStore>, config: AccountsConfig) -> Self {
        Self { store, config }
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<UserProfile> {
        request.validate()?;

        let username = request.username.trim().to_string();
        if !USERNAME_PATTERN.is_match(&username) {
            return Err(AppError::Validation(
                "username may only contain letters, digits and @/./+/-/_".to_string(),
            ));
        }
        if (request.password.chars().count() as u64) < self.config.min_password_length {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters",
                self.config.min_password_length
            )));
        }
        if request.password == username {
            return Err(AppError::Validation(
                "password is too similar to the username".to_string(),
            ));
        }

        let salt = Uuid::new_v4().simple().to_string();
        let hash = hash_password(&salt, &request.password);
        let user = UserProfile::new(username, request.email.trim().to_string(), hash, salt);

        self.store.create_user(&user).await?;
        ACCOUNT_EVENTS_TOTAL.with_label_values(&["signup"]).inc();
        tracing::info!(user_id = %user.id, username = %user.username, "👤 Account created");

        Ok(user)
    }

    /// Check credentials and open a session
    pub async fn login(&self, request: LoginRequest) -> Result<(Session, UserProfile)> {
        let mut user = match self.store.find_user_by_username(&request.username).await? {
            Some(user) if verify_password(&user, &request.password) => user,
            _ => {
                ACCOUNT_EVENTS_TOTAL.with_label_values(&["login_failed"]).inc();
                tracing::warn!(username = %request.username, "Failed login attempt");
                return Err(AppError::Authentication(
                    "Invalid username or password".to_string(),
                ));
            }
        };

        user.last_login = Some(Utc::now());
        self.store.update_user(&user).await?;

        let session = Session::new(user.id);
        self.store.save_session(&session).await?;
        ACCOUNT_EVENTS_TOTAL.with_label_values(&["login"]).inc();
        tracing::info!(user_id = %user.id, "🔑 User logged in");

        Ok((session, user))
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        self.store.delete_session(token).await?;
        ACCOUNT_EVENTS_TOTAL.with_label_values(&["logout"]).inc();
        Ok(())
    }

    /// Resolve a bearer token to its user
    pub async fn authenticate(&self, token: &str) -> Result<UserProfile> {
        let session = self
            .store
            .get_session(token)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid or expired session".to_string()))?;

        self.store
            .get_user(&session.user_id)
            .await?
            .ok_or_else(|| AppError::Authentication("Session user no longer exists".to_string()))
    }

    pub async fn set_staff(&self, username: &str, is_staff: bool) -> Result<UserProfile> {
        let user = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;
        self.apply_staff(user, is_staff).await
    }

    pub async fn set_staff_by_id(&self, id: &Uuid, is_staff: bool) -> Result<UserProfile> {
        let user = self
            .store
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        self.apply_staff(user, is_staff).await
    }

    async fn apply_staff(&self, mut user: UserProfile, is_staff: bool) -> Result<UserProfile> {
        user.is_staff = is_staff;
        self.store.update_user(&user).await?;
        tracing::info!(user_id = %user.id, is_staff, "Staff flag updated");
        Ok(user)
    }
}
