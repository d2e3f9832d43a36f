use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use crate::api::{ApiError, RateFetcher};
use crate::db;
use crate::i18n::Locale;
use crate::models::rate::parse_next_updated;
use crate::models::RateLookup;
use crate::services::visit_service;

/// Errors that abort a rate lookup
#[derive(Debug, Error)]
pub enum RateError {
    #[error("Exchange rate provider error: {0}")]
    Api(#[from] ApiError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Fetch-or-serve policy over the stored rate snapshot
pub struct RateService {
    fetcher: Arc<dyn RateFetcher>,
    base_currency: String,
    // Held for the duration of a refresh so that one fetch serves every
    // request that found the snapshot stale at the same time.
    refresh_lock: Mutex<()>,
}

impl RateService {
    pub fn new(fetcher: Arc<dyn RateFetcher>, base_currency: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_currency: base_currency.into(),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// Look up `code` against the current time
    pub async fn get_rate(&self, pool: &SqlitePool, code: &str) -> Result<RateLookup, RateError> {
        self.get_rate_at(pool, code, Utc::now()).await
    }

    /// Look up `code`, judging staleness against `now`
    pub async fn get_rate_at(
        &self,
        pool: &SqlitePool,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLookup, RateError> {
        if !self.is_stale(pool, now).await? {
            debug!("Serving {} from cache", code);
            return self.lookup_cached(pool, code, now).await;
        }

        let _guard = self.refresh_lock.lock().await;

        // Another request may have refreshed while we waited
        if !self.is_stale(pool, now).await? {
            debug!("Snapshot refreshed concurrently, serving {} from cache", code);
            return self.lookup_cached(pool, code, now).await;
        }

        info!("Rate snapshot missing or stale, fetching from provider");
        let snapshot = self.fetcher.fetch_latest().await?;
        db::rates::replace_snapshot(pool, &snapshot).await?;
        info!(
            "Stored {} rates for {}, next update {}",
            snapshot.rates.len(),
            snapshot.base,
            snapshot.next_updated
        );

        Ok(match snapshot.rate(code) {
            Some(rate) => RateLookup::Found {
                base: snapshot.base.clone(),
                code: code.to_string(),
                rate,
                date: now.date_naive(),
            },
            None => {
                debug!("{} not present in fetched snapshot", code);
                RateLookup::NotFound
            }
        })
    }

    /// True when the store is empty, quoted against another base, past its
    /// expiry, or holds an unreadable expiry
    pub async fn is_stale(&self, pool: &SqlitePool, now: DateTime<Utc>) -> Result<bool, RateError> {
        let Some((base, next_updated)) = db::rates::get_snapshot_info(pool).await? else {
            return Ok(true);
        };

        if base != self.base_currency {
            info!("Stored snapshot is for {}, configured base is {}", base, self.base_currency);
            return Ok(true);
        }

        match parse_next_updated(&next_updated) {
            Some(expiry) => Ok(now >= expiry),
            None => {
                warn!("Unparseable next_updated in store: {}", next_updated);
                Ok(true)
            }
        }
    }

    async fn lookup_cached(
        &self,
        pool: &SqlitePool,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLookup, RateError> {
        Ok(match db::rates::get_rate(pool, code).await? {
            Some(rate) => RateLookup::Found {
                base: self.base_currency.clone(),
                code: code.to_string(),
                rate,
                date: now.date_naive(),
            },
            None => RateLookup::NotFound,
        })
    }
}

/// Handle one rate request and produce the reply text
///
/// The visit is recorded before the lookup, so misses and provider failures
/// still count. Provider and storage failures during the lookup become the
/// "unavailable" text; only a failure to record the visit is returned as an error.
pub async fn answer(
    pool: &SqlitePool,
    service: &RateService,
    locale: Locale,
    user_id: i64,
    text: &str,
) -> Result<String, String> {
    visit_service::log_visit(pool, user_id).await?;

    let code = normalize_code(text);
    if code.is_empty() {
        return Ok(locale.rate_usage().to_string());
    }

    info!("💱 Rate requested by {} for {}", user_id, code);

    Ok(match service.get_rate(pool, &code).await {
        Ok(lookup) => render_reply(&lookup, locale),
        Err(e) => {
            error!("Rate lookup for {} failed: {}", code, e);
            locale.rates_unavailable().to_string()
        }
    })
}

/// Normalize user input into a currency code
pub fn normalize_code(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Render a lookup as the reply text
pub fn render_reply(lookup: &RateLookup, locale: Locale) -> String {
    match lookup {
        RateLookup::Found { base, code, rate, .. } => {
            let date = lookup.formatted_date().unwrap_or_default();
            locale.rate_line(&date, base, *rate, code)
        }
        RateLookup::NotFound => locale.rate_not_found().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::RateSnapshot;
    use chrono::{NaiveDate, TimeZone};
    use serenity::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const NEXT_UPDATE: &str = "Mon, 01 Jan 2024 00:00:00 +0000";

    struct FakeFetcher {
        snapshot: Result<RateSnapshot, ApiError>,
        calls: AtomicUsize,
    }

    impl FakeFetcher {
        fn returning(snapshot: RateSnapshot) -> Arc<Self> {
            Arc::new(Self { snapshot: Ok(snapshot), calls: AtomicUsize::new(0) })
        }

        fn failing(err: ApiError) -> Arc<Self> {
            Arc::new(Self { snapshot: Err(err), calls: AtomicUsize::new(0) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateFetcher for FakeFetcher {
        async fn fetch_latest(&self) -> Result<RateSnapshot, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Give concurrent lookups a chance to interleave
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.snapshot.clone()
        }
    }

    fn snapshot(pairs: &[(&str, f64)], next_updated: &str) -> RateSnapshot {
        RateSnapshot {
            base: "USD".to_string(),
            rates: pairs.iter().map(|(c, r)| (c.to_string(), *r)).collect::<HashMap<_, _>>(),
            next_updated: next_updated.to_string(),
            next_updated_at: parse_next_updated(next_updated).unwrap(),
        }
    }

    fn example_snapshot() -> RateSnapshot {
        snapshot(&[("RUB", 90.5), ("EUR", 0.9)], NEXT_UPDATE)
    }

    fn before_expiry() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 12, 31, 12, 0, 0).unwrap()
    }

    fn service(fetcher: Arc<FakeFetcher>) -> RateService {
        RateService::new(fetcher, "USD")
    }

    #[tokio::test]
    async fn test_empty_store_fetches_and_answers() {
        let pool = test_pool().await;
        let fetcher = FakeFetcher::returning(example_snapshot());
        let service = service(fetcher.clone());

        let lookup = service.get_rate_at(&pool, "RUB", before_expiry()).await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(
            lookup,
            RateLookup::Found {
                base: "USD".to_string(),
                code: "RUB".to_string(),
                rate: 90.5,
                date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            }
        );
        assert_eq!(lookup.formatted_date().as_deref(), Some("31-12-2023"));
        assert_eq!(db::rates::count_rates(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_every_fetched_code_resolves() {
        let pool = test_pool().await;
        let fetched = snapshot(&[("RUB", 90.5), ("EUR", 0.9), ("KZT", 450.25), ("AMD", 400.0)], NEXT_UPDATE);
        let service = service(FakeFetcher::returning(fetched.clone()));

        for (code, rate) in &fetched.rates {
            match service.get_rate_at(&pool, code, before_expiry()).await.unwrap() {
                RateLookup::Found { rate: got, .. } => assert_eq!(got, *rate),
                RateLookup::NotFound => panic!("{} should be found", code),
            }
        }
    }

    #[tokio::test]
    async fn test_fresh_store_is_served_without_fetch() {
        let pool = test_pool().await;
        db::rates::replace_snapshot(&pool, &snapshot(&[("RUB", 80.0)], NEXT_UPDATE)).await.unwrap();

        let fetcher = FakeFetcher::returning(snapshot(&[("RUB", 99.0)], "Tue, 02 Jan 2024 00:00:00 +0000"));
        let service = service(fetcher.clone());

        let lookup = service.get_rate_at(&pool, "RUB", before_expiry()).await.unwrap();

        assert_eq!(fetcher.calls(), 0);
        assert!(matches!(lookup, RateLookup::Found { rate, .. } if rate == 80.0));
    }

    #[tokio::test]
    async fn test_stale_store_fetches_once_and_replaces_rows() {
        let pool = test_pool().await;
        let old = snapshot(&[("RUB", 80.0), ("GEL", 2.7), ("RSD", 108.0)], "Sat, 30 Dec 2023 00:00:00 +0000");
        db::rates::replace_snapshot(&pool, &old).await.unwrap();

        let fetcher = FakeFetcher::returning(example_snapshot());
        let service = service(fetcher.clone());

        let lookup = service.get_rate_at(&pool, "RUB", before_expiry()).await.unwrap();
        assert!(matches!(lookup, RateLookup::Found { rate, .. } if rate == 90.5));
        assert_eq!(fetcher.calls(), 1);

        // Exactly the new entries, never a union with the old ones
        assert_eq!(db::rates::count_rates(&pool).await.unwrap(), 2);
        assert_eq!(db::rates::get_rate(&pool, "GEL").await.unwrap(), None);

        // Now fresh: served from cache
        let lookup = service.get_rate_at(&pool, "EUR", before_expiry()).await.unwrap();
        assert!(matches!(lookup, RateLookup::Found { rate, .. } if rate == 0.9));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_expiry_boundary_is_stale() {
        let pool = test_pool().await;
        db::rates::replace_snapshot(&pool, &example_snapshot()).await.unwrap();
        let service = service(FakeFetcher::returning(example_snapshot()));

        let at_expiry = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(service.is_stale(&pool, at_expiry).await.unwrap());
        assert!(!service.is_stale(&pool, before_expiry()).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_code_is_not_found() {
        let pool = test_pool().await;
        let fetcher = FakeFetcher::returning(example_snapshot());
        let service = service(fetcher.clone());

        // Absent from a freshly fetched snapshot
        let lookup = service.get_rate_at(&pool, "XYZ", before_expiry()).await.unwrap();
        assert_eq!(lookup, RateLookup::NotFound);
        assert_eq!(lookup.formatted_date(), None);

        // Absent from the cached snapshot
        let lookup = service.get_rate_at(&pool, "XYZ", before_expiry()).await.unwrap();
        assert_eq!(lookup, RateLookup::NotFound);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates_and_keeps_store() {
        let pool = test_pool().await;
        let old = snapshot(&[("RUB", 80.0)], "Sat, 30 Dec 2023 00:00:00 +0000");
        db::rates::replace_snapshot(&pool, &old).await.unwrap();

        let fetcher = FakeFetcher::failing(ApiError::Request("connection refused".to_string()));
        let service = service(fetcher.clone());

        let err = service.get_rate_at(&pool, "RUB", before_expiry()).await.unwrap_err();
        assert!(matches!(err, RateError::Api(ApiError::Request(_))));
        assert_eq!(db::rates::get_rate(&pool, "RUB").await.unwrap(), Some(80.0));
    }

    #[tokio::test]
    async fn test_snapshot_for_other_base_is_stale() {
        let pool = test_pool().await;
        // Fresh USD snapshot left over from a previous configuration
        db::rates::replace_snapshot(&pool, &example_snapshot()).await.unwrap();

        let mut eur = snapshot(&[("RUB", 100.0), ("USD", 1.1)], NEXT_UPDATE);
        eur.base = "EUR".to_string();
        let fetcher = FakeFetcher::returning(eur);
        let service = RateService::new(fetcher.clone(), "EUR");

        assert!(service.is_stale(&pool, before_expiry()).await.unwrap());

        let lookup = service.get_rate_at(&pool, "RUB", before_expiry()).await.unwrap();
        assert_eq!(fetcher.calls(), 1);
        assert!(matches!(
            lookup,
            RateLookup::Found { ref base, rate, .. } if base == "EUR" && rate == 100.0
        ));

        // Served from cache under the same base afterwards
        let lookup = service.get_rate_at(&pool, "USD", before_expiry()).await.unwrap();
        assert_eq!(fetcher.calls(), 1);
        assert!(matches!(
            lookup,
            RateLookup::Found { ref base, rate, .. } if base == "EUR" && rate == 1.1
        ));
    }

    #[tokio::test]
    async fn test_unparseable_expiry_counts_as_stale() {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO currency_rates (base, currency, rate, next_updated) VALUES ('USD', 'RUB', 1.0, 'garbage')")
            .execute(&pool)
            .await
            .unwrap();

        let fetcher = FakeFetcher::returning(example_snapshot());
        let service = service(fetcher.clone());

        let lookup = service.get_rate_at(&pool, "RUB", before_expiry()).await.unwrap();
        assert!(matches!(lookup, RateLookup::Found { rate, .. } if rate == 90.5));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_stale_lookups_fetch_once() {
        let pool = test_pool().await;
        let fetcher = FakeFetcher::returning(example_snapshot());
        let service = service(fetcher.clone());
        let now = before_expiry();

        let (rub, eur, xyz) = tokio::join!(
            service.get_rate_at(&pool, "RUB", now),
            service.get_rate_at(&pool, "EUR", now),
            service.get_rate_at(&pool, "XYZ", now),
        );

        assert_eq!(fetcher.calls(), 1);
        assert!(matches!(rub.unwrap(), RateLookup::Found { rate, .. } if rate == 90.5));
        assert!(matches!(eur.unwrap(), RateLookup::Found { rate, .. } if rate == 0.9));
        assert_eq!(xyz.unwrap(), RateLookup::NotFound);
    }

    #[tokio::test]
    async fn test_answer_records_visit_when_fetch_fails() {
        let pool = test_pool().await;
        let service = service(FakeFetcher::failing(ApiError::Request("timeout".to_string())));

        let reply = answer(&pool, &service, Locale::En, 5, "rub").await.unwrap();

        assert_eq!(reply, Locale::En.rates_unavailable());
        assert_eq!(db::visits::count_visits(&pool).await.unwrap(), 1);
        assert_eq!(db::visits::get_distinct_user_ids(&pool).await.unwrap(), vec![5]);
    }

    #[tokio::test]
    async fn test_answer_records_visit_on_miss_and_hit() {
        let pool = test_pool().await;
        // Fresh far into the future so `answer` (which uses the real clock) serves from cache
        let cached = snapshot(&[("RUB", 90.5), ("EUR", 0.9)], "Fri, 01 Jan 2100 00:00:00 +0000");
        db::rates::replace_snapshot(&pool, &cached).await.unwrap();
        let fetcher = FakeFetcher::returning(example_snapshot());
        let service = service(fetcher.clone());

        let reply = answer(&pool, &service, Locale::Ru, 5, "xyz").await.unwrap();
        assert_eq!(reply, "Курс не найден");

        let reply = answer(&pool, &service, Locale::En, 6, " rub ").await.unwrap();
        let today = Utc::now().date_naive().format("%d-%m-%Y").to_string();
        assert_eq!(reply, format!("On {} 1 USD = 90.5 RUB", today));

        assert_eq!(fetcher.calls(), 0);
        assert_eq!(db::visits::count_visits(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_answer_empty_text_shows_usage() {
        let pool = test_pool().await;
        let fetcher = FakeFetcher::returning(example_snapshot());
        let service = service(fetcher.clone());

        let reply = answer(&pool, &service, Locale::En, 8, "   ").await.unwrap();

        assert_eq!(reply, Locale::En.rate_usage());
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(db::visits::count_visits(&pool).await.unwrap(), 1);
    }

    #[test]
    fn test_render_reply() {
        let found = RateLookup::Found {
            base: "USD".to_string(),
            code: "RUB".to_string(),
            rate: 90.5,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        assert_eq!(render_reply(&found, Locale::En), "On 01-01-2024 1 USD = 90.5 RUB");
        assert_eq!(render_reply(&RateLookup::NotFound, Locale::En), "Rate not found");
        assert_eq!(render_reply(&RateLookup::NotFound, Locale::Ru), "Курс не найден");
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  rub\n"), "RUB");
        assert_eq!(normalize_code("Eur"), "EUR");
    }
}
