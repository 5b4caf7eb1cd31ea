use axum::http::HeaderMap;
use secrecy::{ExposeSecret, SecretString};

/// Header carrying the merchant identifier, on callbacks and outbound calls.
pub const MERCHANT_ID_HEADER: &str = "X-MerchantId";
/// Header carrying the shared secret.
pub const SECRET_HEADER: &str = "X-Secret";

/// Validates that an inbound callback claims the expected merchant identity
/// and shared secret.
///
/// Platega authenticates callbacks by echoing the merchant credentials in
/// plain headers; there is no signed payload to verify. Equality against the
/// configured values is the entire check. The comparison is constant-time,
/// but the scheme itself remains a weak trust boundary until the provider
/// offers signed callbacks.
pub struct WebhookAuthenticator {
    merchant_id: String,
    secret_key: SecretString,
}

impl WebhookAuthenticator {
    pub fn new(merchant_id: String, secret_key: SecretString) -> Self {
        Self {
            merchant_id,
            secret_key,
        }
    }

    /// Both headers must be present and match exactly; anything else fails
    /// closed. Header name lookup is case-insensitive.
    pub fn verify(&self, headers: &HeaderMap) -> bool {
        let merchant = headers
            .get(MERCHANT_ID_HEADER)
            .and_then(|v| v.to_str().ok());
        let secret = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());

        match (merchant, secret) {
            (Some(merchant), Some(secret)) => {
                constant_time_compare(merchant, &self.merchant_id)
                    & constant_time_compare(secret, self.secret_key.expose_secret())
            }
            _ => false,
        }
    }
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
