use std::any::Any;

use async_trait::async_trait;

use crate::{app_error::AppResult, domain::entities::payment::PaymentRecord};

/// Data access for payment records.
///
/// The ledger is the only storage surface the reconciliation engine touches
/// directly; everything else goes through collaborator ports.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    async fn find_by_id(&self, payment_id: i64) -> AppResult<Option<PaymentRecord>>;

    async fn find_by_provider_payment_id(
        &self,
        provider_payment_id: &str,
    ) -> AppResult<Option<PaymentRecord>>;

    /// Open the storage transaction that scopes one settlement attempt.
    /// The ledger update and the collaborator writes commit or roll back
    /// together.
    async fn begin_settlement(&self) -> AppResult<Box<dyn SettlementTxn>>;
}

/// One in-flight settlement transaction.
#[async_trait]
pub trait SettlementTxn: Send {
    /// Conditionally flip the record from `pending` to `succeeded`, stamping
    /// the provider transaction id in the same statement.
    ///
    /// Returns `false` when the record was no longer pending, which closes
    /// the race between two concurrent deliveries of the same callback.
    async fn mark_succeeded(
        &mut self,
        payment_id: i64,
        provider_payment_id: &str,
    ) -> AppResult<bool>;

    async fn commit(self: Box<Self>) -> AppResult<()>;

    async fn rollback(self: Box<Self>) -> AppResult<()>;

    /// Escape hatch for collaborator implementations that need the backing
    /// transaction to run their own statements on it.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
