use std::net::SocketAddr;

use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub platega: PlategaConfig,
}

/// Platega gateway settings. Credentials are optional so the service can
/// run with the integration disabled; every webhook is then answered with
/// `platega_disabled` and outbound calls fail fast.
#[derive(Clone)]
pub struct PlategaConfig {
    pub enabled: bool,
    pub merchant_id: Option<String>,
    pub secret_key: Option<SecretString>,
    /// Uppercase ISO code used when the caller does not pick a currency.
    pub default_currency: String,
    pub api_base_url: Url,
    /// Where the gateway sends the payer after a successful payment.
    pub return_url: String,
    pub failed_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());
        let database_url: String = get_env("DATABASE_URL");

        Self {
            bind_addr,
            database_url,
            platega: PlategaConfig::from_env(),
        }
    }
}

impl PlategaConfig {
    pub fn from_env() -> Self {
        let enabled: bool = get_env_default("PLATEGA_ENABLED", true);
        let merchant_id = optional_env("PLATEGA_MERCHANT_ID");
        let secret_key = optional_env("PLATEGA_SECRET_KEY").map(|v| SecretString::new(v.into()));
        let default_currency: String =
            get_env_default("DEFAULT_CURRENCY", "RUB".to_string()).to_uppercase();
        let api_base_url: Url = get_env_default(
            "PLATEGA_API_BASE_URL",
            Url::parse("https://app.platega.io").unwrap(),
        );
        let return_url: String =
            get_env_default("PLATEGA_RETURN_URL", "https://t.me/pipun_bot".to_string());
        let failed_url: String = get_env_default("PLATEGA_FAILED_URL", return_url.clone());

        Self {
            enabled,
            merchant_id,
            secret_key,
            default_currency,
            api_base_url,
            return_url,
            failed_url,
        }
    }

    /// The integration only works when it is enabled and both credentials
    /// are present.
    pub fn is_configured(&self) -> bool {
        self.enabled && self.merchant_id.is_some() && self.secret_key.is_some()
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
