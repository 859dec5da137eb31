//! Embedded schema migrations, applied on every connect.

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;

use crate::error::StoreError;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply pending migrations. Already-applied ones are skipped.
pub async fn run(pool: &SqlitePool) -> Result<(), StoreError> {
    tracing::debug!(available = MIGRATOR.migrations.len(), "checking migrations");
    MIGRATOR.run(pool).await?;
    Ok(())
}
