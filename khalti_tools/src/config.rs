use std::time::Duration;

use log::*;
use shopfront_common::Secret;

const DEFAULT_KHALTI_BASE_URL: &str = "https://a.khalti.com/api/v2";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct KhaltiConfig {
    /// Base URL of the e-payment API, e.g. `https://a.khalti.com/api/v2`.
    pub base_url: String,
    /// The merchant live secret key, sent as `Authorization: key <secret>`.
    pub secret_key: Secret<String>,
    /// The URL the gateway redirects the customer to after payment.
    pub return_url: String,
    /// The merchant site URL, required by the initiate endpoint.
    pub website_url: String,
    /// Upper bound on each gateway round-trip.
    pub timeout: Duration,
}

impl Default for KhaltiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_KHALTI_BASE_URL.to_string(),
            secret_key: Secret::default(),
            return_url: String::default(),
            website_url: String::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl KhaltiConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("KHALTI_BASE_URL").unwrap_or_else(|_| {
            warn!("KHALTI_BASE_URL not set, using the live gateway, {DEFAULT_KHALTI_BASE_URL}");
            DEFAULT_KHALTI_BASE_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("KHALTI_SECRET_KEY").unwrap_or_else(|_| {
            warn!("KHALTI_SECRET_KEY not set, using a (useless) default");
            "live_secret_key_00000000000000".to_string()
        }));
        let return_url = std::env::var("KHALTI_RETURN_URL").unwrap_or_else(|_| {
            warn!("KHALTI_RETURN_URL not set, payments cannot complete without one");
            String::default()
        });
        let website_url = std::env::var("KHALTI_WEBSITE_URL").unwrap_or_default();
        let timeout = std::env::var("KHALTI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Self { base_url, secret_key, return_url, website_url, timeout }
    }
}
