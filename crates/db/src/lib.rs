//! SQLite connection pool factory and schema bootstrap.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use bookman_kernel::{settings::DatabaseSettings, Migration};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Open a connection pool for the configured database.
///
/// Accepts `sqlite:` URLs or a bare file path. File databases are created if missing.
/// In-memory databases are private to a connection, so their pool is pinned to a single
/// connection that is never reaped.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    let url = normalize_url(&settings.url);
    let in_memory = is_in_memory(&url);

    if !in_memory {
        ensure_parent_dir(&url)?;
    }

    let options = SqliteConnectOptions::from_str(&url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let mut pool_options = SqlitePoolOptions::new();
    pool_options = if in_memory {
        pool_options
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        pool_options.max_connections(settings.max_connections.max(1))
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("failed to connect to database '{}'", settings.url))?;

    tracing::info!(target: "bookman-db", url = %url, "connected to SQLite database");
    Ok(pool)
}

/// Apply module schema statements in order.
pub async fn migrate(pool: &SqlitePool, migrations: &[(String, Migration)]) -> anyhow::Result<()> {
    for (module, migration) in migrations {
        tracing::info!(
            target: "bookman-db",
            module = %module,
            migration = migration.id,
            "applying schema"
        );

        sqlx::raw_sql(migration.up)
            .execute(pool)
            .await
            .with_context(|| {
                format!(
                    "schema statement '{}' of module '{}' failed",
                    migration.id, module
                )
            })?;
    }

    Ok(())
}

fn normalize_url(raw: &str) -> String {
    if raw.starts_with("sqlite:") {
        raw.to_string()
    } else if raw == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite://{}", raw)
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn ensure_parent_dir(url: &str) -> anyhow::Result<()> {
    let path = url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
    }
    Ok(())
}
