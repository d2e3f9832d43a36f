use sqlx::sqlite::SqlitePool;
use crate::models::RateSnapshot;

/// Number of rows in the rate table
pub async fn count_rates(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM currency_rates")
        .fetch_one(pool)
        .await
}

/// Base currency and expiry of the stored snapshot, `None` when the table is empty
pub async fn get_snapshot_info(pool: &SqlitePool) -> Result<Option<(String, String)>, sqlx::Error> {
    sqlx::query_as::<_, (String, String)>("SELECT base, next_updated FROM currency_rates LIMIT 1")
        .fetch_optional(pool)
        .await
}

/// Rate for a currency code from the stored snapshot
pub async fn get_rate(pool: &SqlitePool, currency: &str) -> Result<Option<f64>, sqlx::Error> {
    sqlx::query_scalar::<_, f64>("SELECT rate FROM currency_rates WHERE currency = ? LIMIT 1")
        .bind(currency)
        .fetch_optional(pool)
        .await
}

/// Replace the stored snapshot with `snapshot`
///
/// Delete and inserts run in one transaction, so other connections see
/// either the old rows or the new ones.
pub async fn replace_snapshot(pool: &SqlitePool, snapshot: &RateSnapshot) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM currency_rates")
        .execute(&mut *tx)
        .await?;

    for (currency, rate) in &snapshot.rates {
        sqlx::query("INSERT INTO currency_rates (base, currency, rate, next_updated) VALUES (?, ?, ?, ?)")
            .bind(snapshot.base.as_str())
            .bind(currency.as_str())
            .bind(*rate)
            .bind(snapshot.next_updated.as_str())
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await
}
