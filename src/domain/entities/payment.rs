use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an internally tracked payment.
///
/// `Succeeded` is terminal: once a record reaches it, no further status
/// transition is permitted and repeat settlement attempts must no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Canceled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Canceled => "canceled",
        }
    }

    /// Whether this payment has already been settled.
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Succeeded)
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "succeeded" => Ok(PaymentStatus::Succeeded),
            "failed" => Ok(PaymentStatus::Failed),
            "canceled" => Ok(PaymentStatus::Canceled),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// A payment row as tracked in the ledger.
///
/// Everything except `status` and `provider_payment_id` is immutable after
/// creation; `provider_payment_id` is stamped exactly once, at the moment
/// the record becomes `succeeded`.
#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub payment_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub currency: String,
    pub subscription_duration_months: i32,
    pub status: PaymentStatus,
    pub provider_payment_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Normalize a currency amount to the fixed two-decimal representation used
/// for reconciliation. Rounds half-up; amounts are never compared as floats.
pub fn normalize_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
