use std::path::Path;

use anyhow::Context;
use sqlx::sqlite::SqlitePoolOptions;
use tokio::{fs, net::TcpListener, signal};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use scribe_auth::Authenticator;
use scribe_backend_api::{build_router, AppState};
use scribe_config::load as load_config;

mod migrations {
    pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../migrations");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(env_filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("starting Scribe backend");

    let config = load_config().context("failed to load configuration")?;

    ensure_sqlite_path(&config.database.url).await?;

    let db_pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .with_context(|| format!("failed to connect to database {}", config.database.url))?;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&db_pool)
        .await
        .context("failed to enable foreign keys for sqlite")?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&db_pool)
        .await
        .context("failed to enable WAL mode for sqlite")?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&db_pool)
        .await
        .context("failed to set busy timeout for sqlite")?;

    migrations::MIGRATOR
        .run(&db_pool)
        .await
        .context("database migrations failed")?;
    info!("database migrations applied");

    let authenticator = Authenticator::new(db_pool.clone(), &config.auth);
    info!(issuer = %config.auth.issuer, "authentication subsystem ready");

    let state = AppState::new(db_pool, authenticator);
    let app = build_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

/// Ensure the SQLite database file and directory exist before connecting.
async fn ensure_sqlite_path(url: &str) -> anyhow::Result<()> {
    let Some(sqlite_path) = url.strip_prefix("sqlite://") else {
        return Ok(());
    };

    if sqlite_path == ":memory:" {
        return Ok(());
    }

    let path = Path::new(sqlite_path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("failed to create sqlite directory {}", parent.display())
            })?;
        }
    }

    if fs::metadata(path).await.is_err() {
        fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(path)
            .await
            .with_context(|| format!("failed to create sqlite database file {}", path.display()))?;
    }

    Ok(())
}

fn shutdown_signal() -> impl std::future::Future<Output = ()> {
    async {
        if let Err(error) = signal::ctrl_c().await {
            error!(?error, "failed to listen for shutdown signal");
        }
        info!("shutdown signal received");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn ensure_sqlite_path_creates_missing_file_and_directory() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("scribe.db");
        let url = format!("sqlite://{}", db_path.display());

        ensure_sqlite_path(&url).await.unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn ensure_sqlite_path_ignores_memory_urls() {
        ensure_sqlite_path("sqlite://:memory:").await.unwrap();
    }

    #[tokio::test]
    async fn ensure_sqlite_path_ignores_non_sqlite_urls() {
        ensure_sqlite_path("postgres://localhost/scribe")
            .await
            .unwrap();
    }
}
