use std::env;

use chrono::Duration;
use khalti_tools::KhaltiConfig;
use log::*;
use shopfront_common::{Money, Secret};

const DEFAULT_SFS_HOST: &str = "127.0.0.1";
const DEFAULT_SFS_PORT: u16 = 8360;
const DEFAULT_TOKEN_EXPIRY: Duration = Duration::hours(24);
/// Nepal's standard VAT rate, in whole percent.
const DEFAULT_TAX_RATE: i64 = 13;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// VAT rate in whole percent, applied at checkout.
    pub tax_rate: i64,
    /// Flat shipping fee in paisa, applied at checkout.
    pub shipping_fee: Money,
    /// Khalti gateway configuration.
    pub khalti: KhaltiConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SFS_HOST.to_string(),
            port: DEFAULT_SFS_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            tax_rate: DEFAULT_TAX_RATE,
            shipping_fee: Money::default(),
            khalti: KhaltiConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SFS_HOST").ok().unwrap_or_else(|| DEFAULT_SFS_HOST.into());
        let port = env::var("SFS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SFS_PORT. {e} Using the default, {DEFAULT_SFS_PORT}, instead."
                    );
                    DEFAULT_SFS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SFS_PORT);
        let database_url = env::var("SFS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SFS_DATABASE_URL is not set. Please set it to the URL for the Shopfront database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let tax_rate = env::var("SFS_TAX_RATE")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid value for SFS_TAX_RATE. {e} Using {DEFAULT_TAX_RATE} instead.");
                        e
                    })
                    .ok()
            })
            .unwrap_or(DEFAULT_TAX_RATE);
        let shipping_fee = env::var("SFS_SHIPPING_FEE")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid paisa amount for SFS_SHIPPING_FEE. {e} Using 0 instead.");
                        e
                    })
                    .ok()
            })
            .map(Money::from)
            .unwrap_or_default();
        let khalti = KhaltiConfig::new_from_env_or_default();
        Self { host, port, database_url, auth, tax_rate, shipping_fee, khalti }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The shared HMAC secret for signing and verifying access tokens. The identity service that
    /// issues tokens must hold the same secret.
    pub jwt_secret: Secret<String>,
    pub token_expiry: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🪛️ Using a random JWT secret. Tokens issued by other services will not validate against this server, \
             and tokens will not survive a restart. Set SFS_JWT_SECRET in production."
        );
        let secret: String = (0..64).map(|_| format!("{:02x}", rand::random::<u8>())).collect();
        Self { jwt_secret: Secret::new(secret), token_expiry: DEFAULT_TOKEN_EXPIRY }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, String> {
        let secret = env::var("SFS_JWT_SECRET").map_err(|_| "SFS_JWT_SECRET is not set".to_string())?;
        if secret.len() < 32 {
            return Err("SFS_JWT_SECRET must be at least 32 characters".to_string());
        }
        let token_expiry = env::var("SFS_TOKEN_EXPIRY_HOURS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Duration::hours)
            .unwrap_or(DEFAULT_TOKEN_EXPIRY);
        Ok(Self { jwt_secret: Secret::new(secret), token_expiry })
    }
}
