use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use chrono::{Duration, Utc};
use sqlx::{Row, SqlitePool, Transaction};
use thiserror::Error;
use tracing::info;

use scribe_config::AuthConfig;

mod token;

pub use token::{AuthToken, Claims, Identity, TokenIssuer};

pub const ROLE_USER: &str = "ROLE_USER";
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username is already taken")]
    DuplicateUsername,
    #[error("email is already taken")]
    DuplicateEmail,
    #[error("invalid username, email or password")]
    InvalidCredentials,
    #[error("token has expired")]
    TokenExpired,
    #[error("invalid token")]
    TokenInvalid,
    #[error("failed to create token: {0}")]
    TokenCreation(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
}

/// Orchestrates signup and signin against the credential store and hands
/// out stateless bearer tokens.
#[derive(Clone)]
pub struct Authenticator {
    pool: SqlitePool,
    tokens: TokenIssuer,
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: &AuthConfig) -> Self {
        let ttl = Duration::seconds(config.token_ttl_seconds.min(i64::MAX as u64) as i64);
        let tokens = TokenIssuer::new(&config.jwt_secret, config.issuer.clone(), ttl);

        Self { pool, tokens }
    }

    /// Register a new user. Usernames and emails are globally unique; the
    /// username check runs first so a duplicate username wins over a
    /// duplicate email.
    pub async fn signup(
        &self,
        name: &str,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<i64, AuthError> {
        let mut tx = self.pool.begin().await?;

        let username_taken = sqlx::query("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&mut *tx)
            .await?;
        if username_taken.is_some() {
            return Err(AuthError::DuplicateUsername);
        }

        let email_taken = sqlx::query("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&mut *tx)
            .await?;
        if email_taken.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let now = Utc::now().to_rfc3339();
        let password_hash = self.hash_password(password)?;

        let result = sqlx::query(
            "INSERT INTO users (name, username, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(username)
        .bind(email)
        .bind(&password_hash)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let user_id = result.last_insert_rowid();
        self.attach_role(&mut tx, user_id, ROLE_USER).await?;

        tx.commit().await?;

        info!(username, user_id, "user registered");
        Ok(user_id)
    }

    /// Verify credentials and issue a signed token carrying the user's
    /// identity and role set. Lookup and verification failures are folded
    /// into a single `InvalidCredentials` so callers cannot probe for
    /// registered usernames.
    pub async fn signin(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> Result<AuthToken, AuthError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash FROM users WHERE username = ? OR email = ?",
        )
        .bind(username_or_email)
        .bind(username_or_email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(AuthError::InvalidCredentials);
        };

        let stored: String = row.try_get("password_hash")?;
        let stored_hash = PasswordHash::new(&stored)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &stored_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let user_id: i64 = row.try_get("id")?;
        let username: String = row.try_get("username")?;
        let roles = self.fetch_roles(user_id).await?;

        let issued = self.tokens.issue(user_id, &username, roles)?;
        info!(username, user_id, "user signed in");
        Ok(issued)
    }

    /// Validate a bearer token. Pure with respect to the database: the
    /// token alone carries identity and roles.
    pub fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        self.tokens.validate(token)
    }

    async fn attach_role(
        &self,
        tx: &mut Transaction<'_, sqlx::Sqlite>,
        user_id: i64,
        role: &str,
    ) -> Result<(), AuthError> {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) SELECT ?, id FROM roles WHERE name = ?",
        )
        .bind(user_id)
        .bind(role)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn fetch_roles(&self, user_id: i64) -> Result<Vec<String>, AuthError> {
        let rows = sqlx::query(
            "SELECT roles.name FROM roles JOIN user_roles ON user_roles.role_id = roles.id WHERE user_roles.user_id = ? ORDER BY roles.name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| row.try_get::<String, _>("name").map_err(AuthError::from))
            .collect()
    }

    fn hash_password(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }
}
