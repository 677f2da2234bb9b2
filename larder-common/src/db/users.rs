//! Account storage
//!
//! Passwords are stored as bcrypt hashes; the salt lives inside the hash
//! string. Hashing and verification run on the blocking pool. Identifiers
//! (email addresses) are trimmed and lower-cased before they reach the
//! database.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::{Error, Result};

/// A stored account
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub guid: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

/// Credential store used by the web controller
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up an account by identifier
    async fn get(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Create an account; `Error::Conflict` if the identifier is taken
    async fn put(&self, email: &str, password: &str) -> Result<UserRecord>;

    /// True only if the account exists and the password matches
    async fn verify(&self, email: &str, password: &str) -> Result<bool>;

    /// Replace the password of an existing account
    async fn set_password(&self, email: &str, password: &str) -> Result<()>;
}

/// Canonical identifier form: trimmed and lower-cased
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(Error::InvalidInput("Email must not be empty".to_string()));
    }
    Ok(email)
}

fn check_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(Error::InvalidInput("Password must not be empty".to_string()));
    }
    Ok(())
}

/// bcrypt hash of `password` at `cost`
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| Error::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| Error::Internal(format!("Password hashing error: {}", e)))
}

/// Check `password` against a stored bcrypt hash
pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .map_err(|e| Error::Internal(format!("Password verification task failed: {}", e)))?
        .map_err(|e| Error::Internal(format!("Password verification error: {}", e)))
}

/// [`UserStore`] backed by the `users` table
#[derive(Clone)]
pub struct SqliteUserStore {
    db: SqlitePool,
    cost: u32,
}

impl SqliteUserStore {
    pub fn new(db: SqlitePool) -> Self {
        Self::with_cost(db, bcrypt::DEFAULT_COST)
    }

    /// Store hashing at a non-default bcrypt cost
    pub fn with_cost(db: SqlitePool, cost: u32) -> Self {
        Self { db, cost }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn get(&self, email: &str) -> Result<Option<UserRecord>> {
        let email = normalize_email(email)?;
        let row = sqlx::query_as::<_, (String, String, String, NaiveDateTime)>(
            "SELECT guid, email, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(&email)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|(guid, email, password_hash, created_at)| UserRecord {
            guid,
            email,
            password_hash,
            created_at,
        }))
    }

    async fn put(&self, email: &str, password: &str) -> Result<UserRecord> {
        let email = normalize_email(email)?;
        check_password(password)?;

        let guid = Uuid::new_v4().to_string();
        let hash = hash_password(password, self.cost).await?;

        let inserted = sqlx::query("INSERT INTO users (guid, email, password_hash) VALUES (?, ?, ?)")
            .bind(&guid)
            .bind(&email)
            .bind(&hash)
            .execute(&self.db)
            .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(Error::Conflict(format!("Account {} already exists", email)));
            }
            Err(e) => return Err(e.into()),
        }

        info!(email = %email, "Account created");
        self.get(&email)
            .await?
            .ok_or_else(|| Error::Internal(format!("Account {} vanished after insert", email)))
    }

    async fn verify(&self, email: &str, password: &str) -> Result<bool> {
        let Some(user) = self.get(email).await? else {
            return Ok(false);
        };
        verify_password(password, &user.password_hash).await
    }

    async fn set_password(&self, email: &str, password: &str) -> Result<()> {
        let email = normalize_email(email)?;
        check_password(password)?;

        let hash = hash_password(password, self.cost).await?;
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, updated_at = CURRENT_TIMESTAMP WHERE email = ?",
        )
        .bind(&hash)
        .bind(&email)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Account {}", email)));
        }
        info!(email = %email, "Password changed");
        Ok(())
    }
}
