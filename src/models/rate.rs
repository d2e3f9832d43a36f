//! Exchange rate models

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

/// Format of the provider's `time_next_update_utc` field
pub const NEXT_UPDATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Display format for the date in rate replies
pub const REPLY_DATE_FORMAT: &str = "%d-%m-%Y";

/// Full set of rates valid until a single shared expiry
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    pub base: String,
    pub rates: HashMap<String, f64>,
    /// Expiry as sent by the provider, stored verbatim
    pub next_updated: String,
    pub next_updated_at: DateTime<Utc>,
}

impl RateSnapshot {
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }
}

/// Parse a provider expiry string such as `Mon, 01 Jan 2024 00:00:00 +0000`
pub fn parse_next_updated(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value.trim(), NEXT_UPDATE_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Result of a single currency lookup
#[derive(Debug, Clone, PartialEq)]
pub enum RateLookup {
    Found {
        base: String,
        code: String,
        rate: f64,
        date: NaiveDate,
    },
    NotFound,
}

impl RateLookup {
    pub fn formatted_date(&self) -> Option<String> {
        match self {
            RateLookup::Found { date, .. } => Some(date.format(REPLY_DATE_FORMAT).to_string()),
            RateLookup::NotFound => None,
        }
    }
}
