use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;
use secrecy::SecretString;
use url::Url;

use crate::{
    domain::entities::payment::{PaymentRecord, PaymentStatus},
    infra::config::{AppConfig, PlategaConfig},
};

pub fn test_datetime() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
}

/// Pending one-month payment of 300.00 RUB, tweakable via the closure.
pub fn create_test_payment(overrides: impl FnOnce(&mut PaymentRecord)) -> PaymentRecord {
    let mut payment = PaymentRecord {
        payment_id: 77,
        user_id: 42,
        amount: dec!(300.00),
        currency: "RUB".to_string(),
        subscription_duration_months: 1,
        status: PaymentStatus::Pending,
        provider_payment_id: None,
        created_at: Some(test_datetime()),
    };
    overrides(&mut payment);
    payment
}

pub fn create_test_platega_config() -> PlategaConfig {
    PlategaConfig {
        enabled: true,
        merchant_id: Some("merchant-1".to_string()),
        secret_key: Some(SecretString::new("s3cret".into())),
        default_currency: "RUB".to_string(),
        api_base_url: Url::parse("https://app.platega.io").unwrap(),
        return_url: "https://t.me/pipun_bot".to_string(),
        failed_url: "https://t.me/pipun_bot".to_string(),
    }
}

pub fn create_test_app_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://test".to_string(),
        platega: create_test_platega_config(),
    }
}
