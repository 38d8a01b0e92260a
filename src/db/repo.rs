use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::instrument;

pub type Pool = SqlitePool;

/// Open the settings database, creating the file and its directory on first use.
pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("invalid settings database URL {}", database_url))?
        .create_if_missing(true);

    let in_memory = database_url.starts_with("sqlite::memory");
    if !in_memory {
        let filename = options.clone().get_filename();
        if let Some(dir) = filename.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
    }

    // Every connection to an in-memory URL is its own database.
    let max_connections = if in_memory { 1 } else { 4 };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open settings database {}", database_url))?;
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// All stored settings of one plugin, keyed by name.
#[instrument(skip(pool))]
pub async fn read_plugin_config(pool: &Pool, plugin: &str) -> Result<HashMap<String, String>> {
    let rows = sqlx::query("SELECT name, value FROM config_plugins WHERE plugin = ?")
        .bind(plugin)
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| (row.get::<String, _>("name"), row.get::<String, _>("value")))
        .collect())
}

#[instrument(skip(pool))]
pub async fn set_plugin_config(pool: &Pool, plugin: &str, name: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO config_plugins (plugin, name, value) VALUES (?, ?, ?) \
         ON CONFLICT(plugin, name) DO UPDATE SET value = excluded.value, \
         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
    )
    .bind(plugin)
    .bind(name)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}
