//! Schema bootstrap
//!
//! The statements are idempotent (`IF NOT EXISTS`), so running them on every
//! startup is safe.

use sqlx::PgPool;
use tracing::info;

const INIT_SQL: &str = include_str!("init.sql");

/// Create tables and indexes that do not exist yet
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(INIT_SQL).execute(pool).await?;
    info!("Database schema is up to date");
    Ok(())
}
