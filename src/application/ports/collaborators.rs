use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::ledger::SettlementTxn;
use crate::app_error::AppResult;

/// Outcome of activating a subscription for a settled payment.
#[derive(Debug, Clone, Default)]
pub struct ActivationResult {
    pub end_date: Option<DateTime<Utc>>,
    /// User-facing access link for the activated subscription.
    pub subscription_url: Option<String>,
}

/// Outcome of applying referral bonuses tied to a settled payment.
#[derive(Debug, Clone, Default)]
pub struct ReferralBonusResult {
    /// Extended end date for the paying user, when a bonus applied.
    pub referee_new_end_date: Option<DateTime<Utc>>,
    pub referee_bonus_applied_days: i64,
}

/// Extends or starts the paying user's subscription.
#[async_trait]
pub trait SubscriptionActivator: Send + Sync {
    /// Runs inside the settlement transaction carried by `txn`.
    async fn activate_subscription(
        &self,
        txn: &mut dyn SettlementTxn,
        user_id: i64,
        months: i32,
        amount: Decimal,
        payment_id: i64,
    ) -> AppResult<ActivationResult>;
}

/// Applies referral bonuses for a settled payment.
#[async_trait]
pub trait ReferralBonusEngine: Send + Sync {
    /// Bonus application is requested unconditionally; the referee does not
    /// need to have been inactive before this payment. Runs inside the
    /// settlement transaction carried by `txn`. Returns `None` when no
    /// referral relationship applies.
    async fn apply_bonuses_for_payment(
        &self,
        txn: &mut dyn SettlementTxn,
        user_id: i64,
        months: i32,
        payment_id: i64,
    ) -> AppResult<Option<ReferralBonusResult>>;
}

/// User-facing summary of a settled payment, composed by the engine after
/// commit. When a referral bonus extended the subscription, the bonus end
/// date and day count take precedence over the base activation's.
#[derive(Debug, Clone)]
pub struct PaymentSuccessNotice {
    pub provider_payment_id: String,
    pub months: i32,
    pub settled_at: DateTime<Utc>,
    pub base_end_date: Option<DateTime<Utc>>,
    pub final_end_date: Option<DateTime<Utc>>,
    pub bonus_days: i64,
    pub subscription_url: Option<String>,
}

/// Outbound messaging. Always invoked after the settlement transaction has
/// committed; failures are logged and never affect the settlement outcome.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Message the paying user about their activated subscription.
    async fn notify_user_payment_success(
        &self,
        user_id: i64,
        notice: &PaymentSuccessNotice,
    ) -> AppResult<()>;

    /// Ops notification of a received payment.
    async fn notify_payment_received(
        &self,
        user_id: i64,
        amount: Decimal,
        currency: &str,
        months: i32,
    ) -> AppResult<()>;
}
