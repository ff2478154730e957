use std::str::FromStr;

use chrono::{Duration, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tempfile::TempDir;

use scribe_auth::{AuthError, Authenticator, ROLE_ADMIN, ROLE_USER};
use scribe_config::AuthConfig;

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

fn default_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test_secret_key_that_is_long_enough_for_hs256".into(),
        token_ttl_seconds: 3_600,
        issuer: "scribe-test".into(),
    }
}

struct TestContext {
    pool: SqlitePool,
    authenticator: Authenticator,
    _temp_dir: TempDir,
    config: AuthConfig,
}

impl TestContext {
    async fn new(config: AuthConfig) -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("auth.sqlite");
        let db_url = format!("sqlite://{}", db_path.display());

        let mut options = SqliteConnectOptions::from_str(&db_url)?;
        options = options.create_if_missing(true);
        options = options.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        MIGRATOR.run(&pool).await?;

        let authenticator = Authenticator::new(pool.clone(), &config);

        Ok(Self {
            pool,
            authenticator,
            _temp_dir: temp_dir,
            config,
        })
    }

    async fn new_default() -> TestResult<Self> {
        Self::new(default_auth_config()).await
    }

    fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    async fn grant_admin(&self, user_id: i64) -> TestResult<()> {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) SELECT ?, id FROM roles WHERE name = ?",
        )
        .bind(user_id)
        .bind(ROLE_ADMIN)
        .execute(self.pool())
        .await?;
        Ok(())
    }
}

#[tokio::test]
async fn signup_persists_user_with_argon2_hash_and_default_role() -> TestResult {
    let ctx = TestContext::new_default().await?;

    let user_id = ctx
        .authenticator()
        .signup("Alice Example", "alice", "alice@example.com", "s3cret")
        .await?;

    let hash: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(ctx.pool())
        .await?;
    assert!(hash.starts_with("$argon2"), "stored secret must be hashed");
    assert_ne!(hash, "s3cret", "raw password must never be stored");

    let roles: Vec<String> = sqlx::query_scalar(
        "SELECT roles.name FROM roles JOIN user_roles ON user_roles.role_id = roles.id WHERE user_roles.user_id = ?",
    )
    .bind(user_id)
    .fetch_all(ctx.pool())
    .await?;
    assert_eq!(roles, vec![ROLE_USER.to_string()]);

    Ok(())
}

#[tokio::test]
async fn signup_rejects_duplicate_username_regardless_of_other_fields() -> TestResult {
    let ctx = TestContext::new_default().await?;
    ctx.authenticator()
        .signup("Alice", "alice", "a@x.com", "pw1")
        .await?;

    let err = ctx
        .authenticator()
        .signup("Bob", "alice", "b@x.com", "pw2")
        .await
        .expect_err("duplicate username must fail");
    assert!(matches!(err, AuthError::DuplicateUsername));

    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(ctx.pool())
        .await?;
    assert_eq!(user_count, 1, "no additional users should be created");

    Ok(())
}

#[tokio::test]
async fn signup_rejects_duplicate_email() -> TestResult {
    let ctx = TestContext::new_default().await?;
    ctx.authenticator()
        .signup("Alice", "alice", "shared@example.com", "pw1")
        .await?;

    let err = ctx
        .authenticator()
        .signup("Bob", "bob", "shared@example.com", "pw2")
        .await
        .expect_err("duplicate email must fail");
    assert!(matches!(err, AuthError::DuplicateEmail));

    Ok(())
}

#[tokio::test]
async fn signup_salts_identical_passwords_differently() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let first = ctx
        .authenticator()
        .signup("Alice", "alice", "alice@example.com", "s3cret")
        .await?;
    let second = ctx
        .authenticator()
        .signup("Bob", "bob", "bob@example.com", "s3cret")
        .await?;

    let first_hash: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?")
        .bind(first)
        .fetch_one(ctx.pool())
        .await?;
    let second_hash: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?")
        .bind(second)
        .fetch_one(ctx.pool())
        .await?;

    assert_ne!(first_hash, second_hash);
    Ok(())
}

#[tokio::test]
async fn signin_issues_token_that_validates_to_same_identity() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let user_id = ctx
        .authenticator()
        .signup("Alice", "alice", "alice@example.com", "s3cret")
        .await?;

    let issued = ctx.authenticator().signin("alice", "s3cret").await?;

    let ttl = Duration::seconds(ctx.config.token_ttl_seconds as i64);
    let remaining = issued.expires_at - Utc::now();
    assert!(
        (remaining - ttl).num_seconds().abs() <= 2,
        "token ttl should respect configuration"
    );

    let identity = ctx.authenticator().authenticate(&issued.token)?;
    assert_eq!(identity.user_id, user_id);
    assert_eq!(identity.username, "alice");
    assert!(identity.has_role(ROLE_USER));
    assert!(!identity.is_admin());

    Ok(())
}

#[tokio::test]
async fn signin_accepts_email_as_lookup_key() -> TestResult {
    let ctx = TestContext::new_default().await?;
    ctx.authenticator()
        .signup("Alice", "alice", "alice@example.com", "s3cret")
        .await?;

    let issued = ctx
        .authenticator()
        .signin("alice@example.com", "s3cret")
        .await?;
    let identity = ctx.authenticator().authenticate(&issued.token)?;
    assert_eq!(identity.username, "alice");

    Ok(())
}

#[tokio::test]
async fn signin_rejects_wrong_password() -> TestResult {
    let ctx = TestContext::new_default().await?;
    ctx.authenticator()
        .signup("Alice", "alice", "alice@example.com", "s3cret")
        .await?;

    let err = ctx
        .authenticator()
        .signin("alice", "wrong")
        .await
        .expect_err("wrong password must fail");
    assert!(matches!(err, AuthError::InvalidCredentials));

    Ok(())
}

#[tokio::test]
async fn signin_rejects_unknown_user() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let err = ctx
        .authenticator()
        .signin("nobody", "secret")
        .await
        .expect_err("unknown user must fail");
    assert!(matches!(err, AuthError::InvalidCredentials));
    Ok(())
}

#[tokio::test]
async fn token_embeds_admin_role_after_grant() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let user_id = ctx
        .authenticator()
        .signup("Alice", "alice", "alice@example.com", "s3cret")
        .await?;
    ctx.grant_admin(user_id).await?;

    let issued = ctx.authenticator().signin("alice", "s3cret").await?;
    let identity = ctx.authenticator().authenticate(&issued.token)?;

    assert!(identity.is_admin());
    assert!(identity.has_role(ROLE_USER));
    Ok(())
}

#[tokio::test]
async fn authenticate_rejects_tampered_token() -> TestResult {
    let ctx = TestContext::new_default().await?;
    ctx.authenticator()
        .signup("Alice", "alice", "alice@example.com", "s3cret")
        .await?;
    let issued = ctx.authenticator().signin("alice", "s3cret").await?;

    let mut tampered = issued.token.clone();
    tampered.pop();
    tampered.push('x');

    let err = ctx
        .authenticator()
        .authenticate(&tampered)
        .expect_err("tampered token must be rejected");
    assert!(matches!(
        err,
        AuthError::TokenInvalid | AuthError::TokenExpired
    ));

    Ok(())
}
