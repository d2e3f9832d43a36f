use sqlx::sqlite::SqlitePool;

/// Append a visit for a user
pub async fn log_visit(pool: &SqlitePool, user_id: i64) -> Result<i64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO visits (user_id) VALUES (?)")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.last_insert_rowid())
}

/// Every user id that has visited at least once, ascending
pub async fn get_distinct_user_ids(pool: &SqlitePool) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT DISTINCT user_id FROM visits ORDER BY user_id")
        .fetch_all(pool)
        .await
}

/// Total number of recorded visits
pub async fn count_visits(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM visits")
        .fetch_one(pool)
        .await
}
