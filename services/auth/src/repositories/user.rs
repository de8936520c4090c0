//! User repository for database operations

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{
    NewUser, User,
    user::{CREDENTIALS_PROVIDER, GOOGLE_PROVIDER},
};

const USER_COLUMNS: &str = "id, email, name, password_hash, provider, created_at, updated_at";

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a credentials account
    ///
    /// Fails with a unique violation (see [`is_duplicate`]) when the email is taken.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let email = new_user.email.trim().to_lowercase();
        info!("Creating new user: {}", email);

        let password_hash = hash_password(&new_user.password)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (email, name, password_hash, provider)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&email)
        .bind(&new_user.name)
        .bind(&password_hash)
        .bind(CREDENTIALS_PROVIDER)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(&row))
    }

    /// Find a user by email, ignoring case
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.trim().to_lowercase();
        info!("Finding user by email: {}", email);

        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        info!("Finding user by ID: {}", id);

        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Create the account for a Google sign-in, or return the existing one
    ///
    /// An existing account keeps its provider and password; only a missing
    /// display name is filled in.
    pub async fn upsert_google_user(&self, email: &str, name: Option<&str>) -> Result<User> {
        let email = email.trim().to_lowercase();
        info!("Upserting Google user: {}", email);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (email, name, provider)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE
                SET name = COALESCE(users.name, EXCLUDED.name),
                    updated_at = NOW()
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&email)
        .bind(name)
        .bind(GOOGLE_PROVIDER)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(&row))
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        password_hash: row.get("password_hash"),
        provider: row.get("provider"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Hash a password with Argon2id and a random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();
    Ok(hash)
}

/// Check a password against the user's stored hash
///
/// Accounts without a password (OAuth only) never match.
pub fn verify_password(user: &User, password: &str) -> bool {
    let Some(stored) = user.password_hash.as_deref() else {
        return false;
    };

    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Whether an error from [`UserRepository::create`] is a duplicate email
pub fn is_duplicate(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_hash(password_hash: Option<String>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            name: None,
            password_hash,
            provider: CREDENTIALS_PROVIDER.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("Sup3r$ecret").unwrap();
        assert!(hash.starts_with("$argon2"));

        let user = user_with_hash(Some(hash));
        assert!(verify_password(&user, "Sup3r$ecret"));
        assert!(!verify_password(&user, "sup3r$ecret"));
    }

    #[test]
    fn test_oauth_user_has_no_password() {
        let user = user_with_hash(None);
        assert!(!verify_password(&user, ""));
        assert!(!verify_password(&user, "anything"));
    }

    #[test]
    fn test_non_database_error_is_not_duplicate() {
        let error = anyhow::anyhow!("boom");
        assert!(!is_duplicate(&error));
        assert!(!is_duplicate(&anyhow::Error::from(sqlx::Error::RowNotFound)));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_create_and_find_user() -> Result<()> {
        let config = common::database::DatabaseConfig::from_env()?;
        let pool = common::database::init_pool(&config).await?;
        common::database::run_migrations(&pool).await?;
        let repository = UserRepository::new(pool);

        let email = format!("User-{}@Example.com", Uuid::new_v4());
        let user = repository
            .create(&NewUser {
                email: email.clone(),
                name: Some("Test".to_string()),
                password: "Sup3r$ecret".to_string(),
            })
            .await?;
        assert_eq!(user.email, email.to_lowercase());

        let found = repository.find_by_email(&email).await?.unwrap();
        assert_eq!(found.id, user.id);

        let duplicate = repository
            .create(&NewUser {
                email,
                name: None,
                password: "Sup3r$ecret".to_string(),
            })
            .await
            .unwrap_err();
        assert!(is_duplicate(&duplicate));

        Ok(())
    }
}
