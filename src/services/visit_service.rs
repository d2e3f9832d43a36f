use sqlx::sqlite::SqlitePool;
use tracing::debug;
use crate::db;
use crate::models::VisitStats;

/// Record one interaction for `user_id`
pub async fn log_visit(pool: &SqlitePool, user_id: i64) -> Result<(), String> {
    let visit_id = db::visits::log_visit(pool, user_id)
        .await
        .map_err(|e| format!("Database error: {}", e))?;
    debug!("Logged visit {} for user {}", visit_id, user_id);
    Ok(())
}

/// Distinct users who have ever interacted with the bot
pub async fn get_visit_stats(pool: &SqlitePool) -> Result<VisitStats, String> {
    let user_ids = db::visits::get_distinct_user_ids(pool)
        .await
        .map_err(|e| format!("Database error: {}", e))?;
    let total_visits = db::visits::count_visits(pool)
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    Ok(VisitStats { user_ids, total_visits })
}

/// Plain-text dump of the stats
pub fn create_visits_text(stats: &VisitStats) -> String {
    let ids = stats
        .user_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Distinct users: {} ({} visits)\n```\n[{}]\n```",
        stats.distinct_users(),
        stats.total_visits,
        ids
    )
}
