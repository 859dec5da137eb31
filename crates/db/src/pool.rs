use std::str::FromStr;
use std::time::Duration;

use shelf_kernel::settings::DatabaseSettings;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::Sqlite;

use crate::error::StoreError;
use crate::migrations;

/// An open write transaction. Dropping it without [`sqlx::Transaction::commit`]
/// rolls back every write made through it.
pub type Transaction = sqlx::Transaction<'static, Sqlite>;

/// Shared handle to the SQLite database. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open the database named by `settings.url`, creating the file if needed,
    /// and bring its schema up to date.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&settings.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(settings.busy_timeout_ms));

        // Every connection to `:memory:` is its own database, so the pool keeps
        // exactly one and never recycles it.
        let pool = if settings.is_in_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(settings.max_connections)
                .connect_with(
                    options
                        .journal_mode(SqliteJournalMode::Wal)
                        .synchronous(SqliteSynchronous::Normal),
                )
                .await?
        };

        migrations::run(&pool).await?;

        tracing::info!(
            url = %settings.url,
            in_memory = settings.is_in_memory(),
            "database ready"
        );
        Ok(Self { pool })
    }

    /// A private, empty database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::connect(&DatabaseSettings::in_memory()).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction, StoreError> {
        Ok(self.pool.begin().await?)
    }

    /// Wait for in-flight queries and close every connection.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("database closed");
    }
}
