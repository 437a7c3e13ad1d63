use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,

    /// Hex SHA-256 of `salt || password`
    pub password_hash: String,
    pub salt: String,

    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn new(username: String, email: String, password_hash: String, salt: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            salt,
            is_staff: false,
            created_at: Utc::now(),
            last_login: None,
        }
    }
}

/// Public view of an account, without credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&UserProfile> for UserSummary {
    fn from(user: &UserProfile) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            is_staff: user.is_staff,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

/// Bearer session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            token: Uuid::new_v4().simple().to_string(),
            user_id,
            created_at: Utc::now(),
        }
    }
}
