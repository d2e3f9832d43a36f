//! Visit log models

/// Distinct users who have interacted with the bot
#[derive(Debug, Clone, Default)]
pub struct VisitStats {
    pub user_ids: Vec<i64>,
    pub total_visits: i64,
}

impl VisitStats {
    pub fn distinct_users(&self) -> usize {
        self.user_ids.len()
    }
}
