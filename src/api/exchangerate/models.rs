use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// Body of GET /latest/{base}
///
/// Every field is optional so that error bodies (`"result": "error"`) decode
/// with the same schema; `into_snapshot` enforces what a usable answer needs.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestRatesResponse {
    pub result: String,
    #[serde(rename = "error-type")]
    pub error_type: Option<String>,
    pub base_code: Option<String>,
    pub time_next_update_utc: Option<String>,
    pub conversion_rates: Option<HashMap<String, f64>>,
}

/// Errors raised while talking to the exchange rate provider
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// 401 Unauthorized
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// 403 Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// 404 Not Found
    #[error("Not Found: {0}")]
    NotFound(String),
    /// 429 Too Many Requests
    #[error("Rate Limited: {0}")]
    RateLimited(String),
    /// 5xx Server Error
    #[error("Server Error ({0}): {1}")]
    ServerError(u16, String),
    /// Other HTTP errors
    #[error("HTTP Error ({0}): {1}")]
    HttpError(u16, String),
    /// Provider answered with `"result": "error"`
    #[error("Provider error: {0}")]
    Provider(String),
    /// Network/request error
    #[error("Request Error: {0}")]
    Request(String),
    /// Body did not match the expected schema
    #[error("Decode Error: {0}")]
    Decode(String),
}
