use serenity::async_trait;
use crate::models::RateSnapshot;

pub mod exchangerate;

pub use exchangerate::ApiError;

/// Source of full rate snapshots
#[async_trait]
pub trait RateFetcher: Send + Sync {
    /// Fetch the latest snapshot for the configured base currency
    async fn fetch_latest(&self) -> Result<RateSnapshot, ApiError>;
}
