use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::use_cases::reconciliation::WebhookError;

/// The provider's retry loop keys off the status code and expects the short
/// plain-text reason in the body, not a JSON envelope.
impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match self {
            WebhookError::InvalidSignature => StatusCode::FORBIDDEN,
            WebhookError::BadRequest | WebhookError::MissingData => StatusCode::BAD_REQUEST,
            WebhookError::PaymentNotFound => StatusCode::NOT_FOUND,
            WebhookError::Processing => StatusCode::INTERNAL_SERVER_ERROR,
            WebhookError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, self.to_string()).into_response()
    }
}
