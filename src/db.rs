use anyhow::{Context, Result};
use sqlx::any::AnyPoolOptions;
use sqlx::{any::AnyConnectOptions, migrate::Migrator, AnyPool, ConnectOptions};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Once;
use tracing::debug;

use crate::config::data_dir;

// Ensure drivers are installed exactly once for sqlx::any
static INSTALL_DRIVERS: Once = Once::new();

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
}

impl Database {
    // Create a connection pool. Without a URL, use a SQLite file in the user's data directory.
    pub async fn connect(database_url: Option<&str>) -> Result<Self> {
        INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);

        let url = match database_url {
            Some(u) if !u.trim().is_empty() => u.to_string(),
            _ => default_sqlite_url()?,
        };

        let opts = AnyConnectOptions::from_str(&url)
            .with_context(|| format!("invalid database URL: {url}"))?;
        // Quiet by default; callers can enable SQLX_LOG if they want
        let opts = opts.disable_statement_logging();

        let pool = AnyPoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .with_context(|| format!("failed to connect to database: {url}"))?;

        debug!(%url, "database connected");
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.context("running migrations")
    }

    pub fn pool(&self) -> &AnyPool { &self.pool }
}

/// `sqlite://` URL for a file path, creating the file if needed.
pub fn sqlite_url_for(path: &std::path::Path) -> Result<String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("creating db parent dir: {}", parent.display()))?;
    }
    // Encode spaces in the path for a valid sqlite URL
    let path_str = path.to_string_lossy().replace(' ', "%20");
    Ok(format!("sqlite://{path_str}?mode=rwc"))
}

fn default_sqlite_url() -> Result<String> {
    let mut path: PathBuf = data_dir()?;
    path.push("embeddable.db");
    sqlite_url_for(&path)
}
