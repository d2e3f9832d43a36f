use reqwest::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serenity::async_trait;
use std::time::Duration;
use tracing::{debug, warn};
use super::models::{ApiError, LatestRatesResponse};
use crate::api::RateFetcher;
use crate::config::Config;
use crate::models::rate::{parse_next_updated, RateSnapshot};

/// ExchangeRate-API v6 client for the "latest rates" endpoint
pub struct ExchangeRateClient {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
    base_currency: String,
}

impl ExchangeRateClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://v6.exchangerate-api.com/v6";

    /// Create a new client with custom base URL (for testing)
    pub fn with_base_url(api_key: String, base_currency: String, base_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            base_currency,
        }
    }

    /// Build the client described by the process configuration
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let http_client = Self::build_http_client(config.http_timeout)?;
        Ok(Self {
            http_client,
            api_key: config.exchange_api_key.clone(),
            base_url: config.exchange_api_url.trim_end_matches('/').to_string(),
            base_currency: config.base_currency.clone(),
        })
    }

    fn build_http_client(timeout: Duration) -> Result<HttpClient, ApiError> {
        HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Request(format!("Failed to build HTTP client: {}", e)))
    }

    /// Create default headers with authorization
    fn create_headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| ApiError::Request(format!("Failed to create auth header: {}", e)))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    /// Map a non-success status to an error kind
    async fn handle_error_response(status: reqwest::StatusCode, response: reqwest::Response) -> ApiError {
        let status_code = status.as_u16();
        let body_text = response.text().await.unwrap_or_default();

        match status_code {
            401 => ApiError::Unauthorized(body_text),
            403 => ApiError::Forbidden(body_text),
            404 => ApiError::NotFound(body_text),
            429 => {
                warn!("Exchange rate provider is rate limiting us");
                ApiError::RateLimited(body_text)
            }
            500..=599 => {
                warn!("Server error {}: {}", status_code, body_text);
                ApiError::ServerError(status_code, body_text)
            }
            _ => ApiError::HttpError(status_code, body_text),
        }
    }

    /// GET /latest/{base}
    ///
    /// Returns the whole conversion table for the base currency together with
    /// the provider's declared next update time.
    pub async fn get_latest_rates(&self) -> Result<RateSnapshot, ApiError> {
        let url = format!("{}/latest/{}", self.base_url, self.base_currency);
        let headers = self.create_headers()?;

        debug!("Requesting latest rates for {}", self.base_currency);

        let response = self.http_client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| ApiError::Request(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::handle_error_response(status, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Request(format!("Failed to read response: {}", e)))?;

        let parsed: LatestRatesResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::Decode(format!("Failed to parse response: {}", e)))?;

        parsed.into_snapshot(&self.base_currency)
    }
}

impl LatestRatesResponse {
    /// Validate the response and turn it into a snapshot
    pub fn into_snapshot(self, requested_base: &str) -> Result<RateSnapshot, ApiError> {
        if self.result != "success" {
            return Err(ApiError::Provider(
                self.error_type.unwrap_or_else(|| self.result.clone()),
            ));
        }

        let rates = self
            .conversion_rates
            .filter(|rates| !rates.is_empty())
            .ok_or_else(|| ApiError::Decode("conversion_rates missing or empty".to_string()))?;

        let next_updated = self
            .time_next_update_utc
            .ok_or_else(|| ApiError::Decode("time_next_update_utc missing".to_string()))?;

        let next_updated_at = parse_next_updated(&next_updated).ok_or_else(|| {
            ApiError::Decode(format!("Invalid time_next_update_utc: {}", next_updated))
        })?;

        Ok(RateSnapshot {
            base: self.base_code.unwrap_or_else(|| requested_base.to_string()),
            rates,
            next_updated,
            next_updated_at,
        })
    }
}

#[async_trait]
impl RateFetcher for ExchangeRateClient {
    async fn fetch_latest(&self) -> Result<RateSnapshot, ApiError> {
        self.get_latest_rates().await
    }
}
