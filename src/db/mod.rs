use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::debug;

pub mod rates;
pub mod visits;

const CREATE_TABLES_SQL: &str = include_str!("../../migrations/create_tables.sql");

/// Open (creating if missing) the SQLite database and create tables
pub async fn init_db(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create all database tables
async fn create_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    debug!("Applying schema");
    sqlx::raw_sql(CREATE_TABLES_SQL).execute(pool).await?;
    Ok(())
}

/// Single-connection in-memory database with the schema applied
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    create_tables(&pool).await.expect("schema");
    pool
}
