use reqwest::Client;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::{
    domain::entities::webhook_event::encode_correlation_token,
    infra::{config::PlategaConfig, http_client::build_client},
    use_cases::webhook_auth::{MERCHANT_ID_HEADER, SECRET_HEADER},
};

/// Payment method offered when the caller does not pick one. `2` is SBP.
pub const DEFAULT_PAYMENT_METHOD: u32 = 2;

/// Failures of an outbound gateway call.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Integration disabled or credentials missing; no I/O was attempted.
    #[error("service_not_configured")]
    NotConfigured,
    /// Transport failure, including the request timeout.
    #[error("gateway request failed: {0}")]
    Network(String),
    /// The gateway answered with a non-success status.
    #[error("gateway returned status {status}")]
    Http { status: u16, body: Value },
    /// The body was not valid JSON.
    #[error("gateway returned unparsable body (status {status})")]
    InvalidJson { status: u16, raw: String },
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Response of a transaction creation. Only the fields the service reads
/// are typed; everything else rides along in `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedTransaction {
    #[serde(default)]
    pub id: Option<String>,
    /// Checkout URL the payer is sent to.
    #[serde(default)]
    pub redirect: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Response of a status poll.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionState {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Outbound client for the Platega transaction API.
///
/// One instance is built at startup and shared; the underlying connection
/// pool is reused across calls.
pub struct PlategaClient {
    client: Client,
    config: PlategaConfig,
}

impl PlategaClient {
    pub fn new(config: PlategaConfig) -> Self {
        Self {
            client: build_client(),
            config,
        }
    }

    fn credentials(&self) -> GatewayResult<(&str, &str)> {
        if !self.config.is_configured() {
            error!("platega client is not configured, refusing outbound call");
            return Err(GatewayError::NotConfigured);
        }
        let (Some(merchant_id), Some(secret_key)) =
            (&self.config.merchant_id, &self.config.secret_key)
        else {
            return Err(GatewayError::NotConfigured);
        };
        Ok((merchant_id, secret_key.expose_secret()))
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.config.api_base_url.as_str().trim_end_matches('/');
        format!("{base}/{path}")
    }

    /// Create a payment transaction and obtain the checkout redirect.
    ///
    /// The correlation token in `payload` is echoed back verbatim on the
    /// settlement callback and carries the internal payment id.
    pub async fn create_payment(
        &self,
        payment_db_id: i64,
        user_id: i64,
        months: i32,
        amount: Decimal,
        currency: Option<&str>,
        payment_method: Option<u32>,
    ) -> GatewayResult<CreatedTransaction> {
        let (merchant_id, secret_key) = self.credentials()?;

        let payload = build_create_payload(
            &self.config,
            payment_db_id,
            user_id,
            months,
            amount,
            currency,
            payment_method,
        );

        let response = self
            .client
            .post(self.endpoint("transaction/process"))
            .header(MERCHANT_ID_HEADER, merchant_id)
            .header(SECRET_HEADER, secret_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        decode_response(response, &[200, 201]).await
    }

    /// Poll the current state of a transaction.
    pub async fn check_status(&self, transaction_id: &str) -> GatewayResult<TransactionState> {
        let (merchant_id, secret_key) = self.credentials()?;

        let response = self
            .client
            .get(self.endpoint(&format!("transaction/{transaction_id}")))
            .header(MERCHANT_ID_HEADER, merchant_id)
            .header(SECRET_HEADER, secret_key)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        decode_response(response, &[200]).await
    }
}

fn build_create_payload(
    config: &PlategaConfig,
    payment_db_id: i64,
    user_id: i64,
    months: i32,
    amount: Decimal,
    currency: Option<&str>,
    payment_method: Option<u32>,
) -> Value {
    let currency_code = currency
        .map(str::to_uppercase)
        .unwrap_or_else(|| config.default_currency.clone());
    // The gateway takes whole currency units.
    let amount_int = match amount.trunc().to_i64() {
        Some(units) => units,
        None => {
            warn!(%amount, "amount does not fit the gateway's integer units, sending 0");
            0
        }
    };

    json!({
        "paymentMethod": payment_method.unwrap_or(DEFAULT_PAYMENT_METHOD),
        "paymentDetails": {
            "amount": amount_int,
            "currency": currency_code,
        },
        "description": format!("Subscription {months} month(s)"),
        "payload": encode_correlation_token(user_id, months, payment_db_id),
        "return": config.return_url,
        "failedUrl": config.failed_url,
    })
}

async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
    ok_statuses: &[u16],
) -> GatewayResult<T> {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| GatewayError::Network(e.to_string()))?;

    // An empty body is treated as an empty object, matching the gateway's
    // occasional bare-status replies.
    let raw = if text.trim().is_empty() { "{}" } else { &text };
    let body: Value = match serde_json::from_str(raw) {
        Ok(body) => body,
        Err(e) => {
            error!(status, body = %text, error = %e, "platega returned unparsable body");
            return Err(GatewayError::InvalidJson { status, raw: text });
        }
    };

    if !ok_statuses.contains(&status) {
        error!(status, body = %body, "platega returned an error response");
        return Err(GatewayError::Http { status, body });
    }

    serde_json::from_value(body.clone()).map_err(|e| {
        error!(status, body = %body, error = %e, "platega response did not match the expected shape");
        GatewayError::InvalidJson {
            status,
            raw: body.to_string(),
        }
    })
}
