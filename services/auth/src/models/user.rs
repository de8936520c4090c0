//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provider name stored for email/password accounts
pub const CREDENTIALS_PROVIDER: &str = "credentials";
/// Provider name stored for Google accounts
pub const GOOGLE_PROVIDER: &str = "google";

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    /// Always stored lowercased
    pub email: String,
    pub name: Option<String>,
    /// Argon2 PHC string; `None` for accounts created through OAuth
    pub password_hash: Option<String>,
    pub provider: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New credentials account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    /// Plain text; hashed by the repository before it is stored
    pub password: String,
}

/// Public view of a user, safe to return to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub provider: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            provider: user.provider.clone(),
            created_at: user.created_at,
        }
    }
}
