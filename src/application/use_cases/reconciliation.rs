use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    app_error::AppResult,
    application::{
        ports::{
            ActivationResult, NotificationDispatcher, PaymentLedger, PaymentSuccessNotice,
            ReferralBonusEngine, ReferralBonusResult, SettlementTxn, SubscriptionActivator,
        },
        use_cases::webhook_auth::WebhookAuthenticator,
    },
    domain::entities::{
        payment::{normalize_amount, PaymentRecord},
        webhook_event::{WebhookEvent, WebhookParseError},
    },
};

/// Failure taxonomy of the inbound webhook flow. Each variant maps to the
/// HTTP reply the provider's retry loop keys off; the `Display` string is
/// the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Bad or missing merchant credentials.
    #[error("invalid_signature")]
    InvalidSignature,
    /// The body is not valid JSON.
    #[error("bad_request")]
    BadRequest,
    /// The body decoded but lacks the transaction id or status.
    #[error("missing_data")]
    MissingData,
    /// No payment record correlates with the callback.
    #[error("payment_not_found")]
    PaymentNotFound,
    /// The settlement transaction failed and was rolled back; the provider
    /// is expected to redeliver and the idempotency gate makes that safe.
    #[error("processing_error")]
    Processing,
    /// The integration is disabled or missing credentials.
    #[error("platega_disabled")]
    NotConfigured,
}

impl From<WebhookParseError> for WebhookError {
    fn from(err: WebhookParseError) -> Self {
        match err {
            WebhookParseError::BadRequest => WebhookError::BadRequest,
            WebhookParseError::MissingData => WebhookError::MissingData,
        }
    }
}

/// How a callback was ultimately handled. All variants answer `200 OK`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookAck {
    /// Settlement ran to commit on this delivery.
    Settled,
    /// The payment was already settled; side effects were skipped.
    Duplicate,
    /// Non-confirming status acknowledged without touching the ledger.
    Ignored,
}

/// Maps a callback to exactly one payment record. The id embedded in the
/// correlation token wins; the provider transaction id is the fallback.
pub struct CorrelationResolver {
    ledger: Arc<dyn PaymentLedger>,
}

impl CorrelationResolver {
    pub fn new(ledger: Arc<dyn PaymentLedger>) -> Self {
        Self { ledger }
    }

    pub async fn resolve(&self, event: &WebhookEvent) -> AppResult<Option<PaymentRecord>> {
        if let Some(payment_db_id) = event.payment_db_id {
            if let Some(record) = self.ledger.find_by_id(payment_db_id).await? {
                return Ok(Some(record));
            }
        }
        self.ledger
            .find_by_provider_payment_id(&event.transaction_id)
            .await
    }
}

enum Settlement {
    /// Another delivery flipped the record first; nothing to undo.
    AlreadySettled,
    Settled {
        activation: ActivationResult,
        bonus: Option<ReferralBonusResult>,
    },
}

/// Reconciles gateway callbacks against the payment ledger.
///
/// Each callback is an independent unit of work; duplicate deliveries for
/// the same payment may run concurrently and exactly one of them settles.
pub struct ReconciliationEngine {
    /// `None` when the integration is not configured; every callback is
    /// then answered with `platega_disabled`.
    authenticator: Option<WebhookAuthenticator>,
    ledger: Arc<dyn PaymentLedger>,
    resolver: CorrelationResolver,
    activator: Arc<dyn SubscriptionActivator>,
    referral: Arc<dyn ReferralBonusEngine>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl ReconciliationEngine {
    pub fn new(
        authenticator: Option<WebhookAuthenticator>,
        ledger: Arc<dyn PaymentLedger>,
        activator: Arc<dyn SubscriptionActivator>,
        referral: Arc<dyn ReferralBonusEngine>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        let resolver = CorrelationResolver::new(ledger.clone());
        Self {
            authenticator,
            ledger,
            resolver,
            activator,
            referral,
            notifier,
        }
    }

    /// Handle one webhook delivery end to end: authenticate, decode,
    /// correlate and, for a confirmed transaction, drive the atomic
    /// settlement followed by best-effort notifications.
    pub async fn process_callback(
        &self,
        headers: &HeaderMap,
        body: &str,
    ) -> Result<WebhookAck, WebhookError> {
        let Some(authenticator) = &self.authenticator else {
            return Err(WebhookError::NotConfigured);
        };

        if !authenticator.verify(headers) {
            error!("webhook rejected: invalid signature or merchant mismatch");
            return Err(WebhookError::InvalidSignature);
        }

        let event = WebhookEvent::from_json(body)?;

        if !event.status.is_confirmed() {
            info!(
                transaction_id = %event.transaction_id,
                status = event.status.as_str(),
                "ignoring non-confirming callback"
            );
            return Ok(WebhookAck::Ignored);
        }

        let payment = self.resolver.resolve(&event).await.map_err(|e| {
            error!(transaction_id = %event.transaction_id, error = %e, "correlation lookup failed");
            WebhookError::Processing
        })?;
        let Some(payment) = payment else {
            error!(
                transaction_id = %event.transaction_id,
                payment_db_id = ?event.payment_db_id,
                "payment not found for callback"
            );
            return Err(WebhookError::PaymentNotFound);
        };

        // Fast path for replayed deliveries of an already settled payment.
        if payment.status.is_settled() {
            info!(
                payment_id = payment.payment_id,
                "payment already succeeded, acknowledging duplicate"
            );
            return Ok(WebhookAck::Duplicate);
        }

        self.reconcile_amount(&payment, &event);

        let months = payment.subscription_duration_months.max(1);

        let mut txn = self.ledger.begin_settlement().await.map_err(|e| {
            error!(payment_id = payment.payment_id, error = %e, "failed to open settlement transaction");
            WebhookError::Processing
        })?;

        let outcome = match self
            .run_settlement(txn.as_mut(), &payment, &event, months)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    payment_id = payment.payment_id,
                    error = %e,
                    "settlement failed, rolling back"
                );
                if let Err(rb) = txn.rollback().await {
                    error!(payment_id = payment.payment_id, error = %rb, "rollback failed");
                }
                return Err(WebhookError::Processing);
            }
        };

        match outcome {
            Settlement::AlreadySettled => {
                if let Err(e) = txn.rollback().await {
                    error!(payment_id = payment.payment_id, error = %e, "rollback failed");
                }
                info!(
                    payment_id = payment.payment_id,
                    "payment settled concurrently, acknowledging duplicate"
                );
                Ok(WebhookAck::Duplicate)
            }
            Settlement::Settled { activation, bonus } => {
                txn.commit().await.map_err(|e| {
                    error!(payment_id = payment.payment_id, error = %e, "settlement commit failed");
                    WebhookError::Processing
                })?;

                info!(
                    payment_id = payment.payment_id,
                    transaction_id = %event.transaction_id,
                    "payment settled"
                );

                self.dispatch_notifications(&payment, &event, months, activation, bonus)
                    .await;
                Ok(WebhookAck::Settled)
            }
        }
    }

    /// Amount discrepancies are logged, not rejected: accepting the
    /// provider's confirmation for a mismatched amount is current business
    /// policy for this integration.
    fn reconcile_amount(&self, payment: &PaymentRecord, event: &WebhookEvent) {
        let Some(reported) = event.amount else { return };
        let expected = normalize_amount(payment.amount);
        if normalize_amount(reported) != expected {
            warn!(
                payment_id = payment.payment_id,
                expected = %expected,
                reported = %reported,
                "amount mismatch on confirmed callback"
            );
        }
    }

    async fn run_settlement(
        &self,
        txn: &mut dyn SettlementTxn,
        payment: &PaymentRecord,
        event: &WebhookEvent,
        months: i32,
    ) -> AppResult<Settlement> {
        // Re-checked under the transaction: only one delivery wins the flip.
        let flipped = txn
            .mark_succeeded(payment.payment_id, &event.transaction_id)
            .await?;
        if !flipped {
            return Ok(Settlement::AlreadySettled);
        }

        let activation = self
            .activator
            .activate_subscription(txn, payment.user_id, months, payment.amount, payment.payment_id)
            .await?;

        let bonus = self
            .referral
            .apply_bonuses_for_payment(txn, payment.user_id, months, payment.payment_id)
            .await?;

        Ok(Settlement::Settled { activation, bonus })
    }

    async fn dispatch_notifications(
        &self,
        payment: &PaymentRecord,
        event: &WebhookEvent,
        months: i32,
        activation: ActivationResult,
        bonus: Option<ReferralBonusResult>,
    ) {
        let base_end_date = activation.end_date;
        let mut final_end_date = activation.end_date;
        let mut bonus_days = 0;
        if let Some(bonus) = &bonus {
            if let Some(extended) = bonus.referee_new_end_date {
                final_end_date = Some(extended);
                bonus_days = bonus.referee_bonus_applied_days;
            }
        }

        let notice = PaymentSuccessNotice {
            provider_payment_id: event.transaction_id.clone(),
            months,
            settled_at: Utc::now(),
            base_end_date,
            final_end_date,
            bonus_days,
            subscription_url: activation.subscription_url.clone(),
        };

        if let Err(e) = self
            .notifier
            .notify_user_payment_success(payment.user_id, &notice)
            .await
        {
            error!(
                user_id = payment.user_id,
                error = %e,
                "failed to message user about settled payment"
            );
        }

        if let Err(e) = self
            .notifier
            .notify_payment_received(payment.user_id, payment.amount, &payment.currency, months)
            .await
        {
            error!(
                user_id = payment.user_id,
                error = %e,
                "failed to send ops notification"
            );
        }
    }
}
