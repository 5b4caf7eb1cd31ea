use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Gateway vocabulary for a transaction's state as reported in callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Confirmed,
    Canceled,
    Pending,
    Other(String),
}

impl TransactionStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "CONFIRMED" => TransactionStatus::Confirmed,
            "CANCELED" => TransactionStatus::Canceled,
            "PENDING" => TransactionStatus::Pending,
            other => TransactionStatus::Other(other.to_string()),
        }
    }

    /// Only confirmed transactions trigger settlement; every other status
    /// is acknowledged without side effects.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, TransactionStatus::Confirmed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransactionStatus::Confirmed => "CONFIRMED",
            TransactionStatus::Canceled => "CANCELED",
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Other(s) => s,
        }
    }
}

/// Reasons a callback body fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WebhookParseError {
    /// The body is not valid JSON.
    #[error("bad_request")]
    BadRequest,
    /// The body decoded but lacks the transaction id or status.
    #[error("missing_data")]
    MissingData,
}

#[derive(Debug, Deserialize)]
struct RawCallback {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    amount: Option<Value>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    payload: Option<String>,
}

/// A normalized Platega callback event.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub transaction_id: String,
    pub status: TransactionStatus,
    /// Provider-reported amount, kept raw; `None` when absent or unparsable.
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    /// Internal payment id recovered from the correlation token, if any.
    pub payment_db_id: Option<i64>,
}

impl WebhookEvent {
    /// Decode a callback body. The correlation hint is best-effort: a
    /// missing or junk `payload` falls back to provider-id correlation
    /// instead of failing the request.
    pub fn from_json(body: &str) -> Result<Self, WebhookParseError> {
        let raw: RawCallback = serde_json::from_str(body).map_err(|e| {
            tracing::error!(error = %e, "failed to decode callback body");
            WebhookParseError::BadRequest
        })?;

        let transaction_id = raw.id.filter(|s| !s.is_empty());
        let status = raw.status.filter(|s| !s.is_empty());
        let (Some(transaction_id), Some(status)) = (transaction_id, status) else {
            tracing::error!("callback missing transaction id or status");
            return Err(WebhookParseError::MissingData);
        };

        Ok(Self {
            transaction_id,
            status: TransactionStatus::parse(&status),
            amount: raw.amount.and_then(parse_amount),
            currency: raw.currency,
            payment_db_id: raw.payload.as_deref().and_then(extract_payment_db_id),
        })
    }
}

/// The gateway reports amounts as either a JSON number or a string.
fn parse_amount(value: Value) -> Option<Decimal> {
    let raw = match value {
        Value::String(s) if !s.is_empty() => s,
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    match raw.parse::<Decimal>() {
        Ok(amount) => Some(amount),
        Err(_) => {
            tracing::warn!(raw = %raw, "unparsable amount in callback");
            None
        }
    }
}

/// Build the opaque correlation token sent with an outbound payment request
/// and echoed back in the callback's `payload` field.
pub fn encode_correlation_token(user_id: i64, months: i32, payment_db_id: i64) -> String {
    format!("user_id:{user_id};months:{months};payment_db_id:{payment_db_id}")
}

/// Scan a correlation token for the internal payment id.
///
/// A non-numeric value is logged and treated as "no hint", never an error;
/// correlation then falls back to the provider transaction id.
pub fn extract_payment_db_id(token: &str) -> Option<i64> {
    for part in token.split(';') {
        if let Some(value) = part.strip_prefix("payment_db_id:") {
            return match value.trim().parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    tracing::warn!(value, "invalid payment_db_id in correlation token");
                    None
                }
            };
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_correlation_token_round_trip() {
        let token = encode_correlation_token(42, 1, 77);
        assert_eq!(token, "user_id:42;months:1;payment_db_id:77");
        assert_eq!(extract_payment_db_id(&token), Some(77));
    }

    #[test]
    fn test_extract_ignores_missing_or_junk_segments() {
        assert_eq!(extract_payment_db_id("user_id:42;months:1"), None);
        assert_eq!(extract_payment_db_id(""), None);
        assert_eq!(extract_payment_db_id("payment_db_id:abc"), None);
    }

    #[test]
    fn test_status_vocabulary() {
        assert!(TransactionStatus::parse("CONFIRMED").is_confirmed());
        assert!(!TransactionStatus::parse("PENDING").is_confirmed());
        assert!(!TransactionStatus::parse("CANCELED").is_confirmed());
        assert_eq!(
            TransactionStatus::parse("REJECTED"),
            TransactionStatus::Other("REJECTED".to_string())
        );
    }

    #[test]
    fn test_from_json_happy_path() {
        let body = r#"{"id":"tx-9","status":"CONFIRMED","amount":"300.00","currency":"RUB","payload":"user_id:42;months:1;payment_db_id:77"}"#;
        let event = WebhookEvent::from_json(body).unwrap();
        assert_eq!(event.transaction_id, "tx-9");
        assert!(event.status.is_confirmed());
        assert_eq!(event.amount, Some(dec!(300.00)));
        assert_eq!(event.currency.as_deref(), Some("RUB"));
        assert_eq!(event.payment_db_id, Some(77));
    }

    #[test]
    fn test_from_json_accepts_numeric_amount() {
        let body = r#"{"id":"tx-9","status":"CONFIRMED","amount":300.5}"#;
        let event = WebhookEvent::from_json(body).unwrap();
        assert_eq!(event.amount, Some(dec!(300.5)));
        assert_eq!(event.payment_db_id, None);
    }

    #[test]
    fn test_from_json_rejects_invalid_json() {
        assert_eq!(
            WebhookEvent::from_json("{not json").unwrap_err(),
            WebhookParseError::BadRequest
        );
    }

    #[test]
    fn test_from_json_requires_id_and_status() {
        assert_eq!(
            WebhookEvent::from_json(r#"{"status":"CONFIRMED"}"#).unwrap_err(),
            WebhookParseError::MissingData
        );
        assert_eq!(
            WebhookEvent::from_json(r#"{"id":"tx-9"}"#).unwrap_err(),
            WebhookParseError::MissingData
        );
        assert_eq!(
            WebhookEvent::from_json(r#"{"id":"","status":"CONFIRMED"}"#).unwrap_err(),
            WebhookParseError::MissingData
        );
    }
}
