//! Settings persistence on SQLite.
//!
//! - `repo`: SQL-only functions over the `config_plugins` table.
//! - [`SqliteSettingsStore`]: the [`SettingsStore`] a host without its own
//!   configuration storage plugs into the repository.

pub mod repo;

pub use repo::*;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

use crate::settings::SettingsStore;

#[derive(Debug, Clone)]
pub struct SqliteSettingsStore {
    pool: Pool,
}

impl SqliteSettingsStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `database_url` and migrate it.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = init_pool(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn read(&self, namespace: &str) -> Result<HashMap<String, String>> {
        read_plugin_config(&self.pool, namespace).await
    }

    async fn write(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        set_plugin_config(&self.pool, namespace, key, value).await
    }
}
