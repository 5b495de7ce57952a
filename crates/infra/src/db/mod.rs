//! Database adapters: connection pool, migrations and one repository per table.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::info;

use crate::error::{StoreResult, map_sqlx_error};

pub mod dishes;
pub mod menu;
pub mod orders;
pub mod products;
pub mod tables;
pub mod units;
pub mod users;

pub use dishes::{DishIngredientStore, DishStore};
pub use menu::MenuStore;
pub use orders::OrderStore;
pub use products::ProductStore;
pub use tables::TableStore;
pub use units::UnitStore;
pub use users::{StoredCredentials, UserStore};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Connection settings for [`connect`].
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }

    fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Open the pool and bring the schema up to date.
///
/// An in-memory database lives only as long as its connection, so the pool is
/// pinned to exactly one connection that never expires.
pub async fn connect(config: &DbConfig) -> StoreResult<SqlitePool> {
    let mut options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| map_sqlx_error("parse_database_url", e))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool_options = if config.is_in_memory() {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        options = options.journal_mode(SqliteJournalMode::Wal);
        SqlitePoolOptions::new().max_connections(config.max_connections.max(1))
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;

    migrate(&pool).await?;
    info!(url = %config.url, "database ready");
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> StoreResult<()> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| map_sqlx_error("migrate", sqlx::Error::Migrate(Box::new(e))))
}

#[cfg(test)]
pub(crate) mod testing {
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    use super::{DbConfig, connect};

    pub async fn pool() -> SqlitePool {
        connect(&DbConfig::in_memory()).await.unwrap()
    }

    /// File-backed pool with several connections; the database lives until
    /// the returned directory is dropped.
    pub async fn file_pool(max_connections: u32) -> (SqlitePool, TempDir) {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("cafeteria.db").display());
        let pool = connect(&DbConfig {
            url,
            max_connections,
        })
        .await
        .unwrap();
        (pool, dir)
    }
}
