use std::any::Any;

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Postgres, Row, Transaction};

use super::PostgresPersistence;
use crate::{
    app_error::{AppError, AppResult},
    application::ports::{PaymentLedger, SettlementTxn},
    domain::entities::payment::{PaymentRecord, PaymentStatus},
};

const SELECT_COLS: &str = "payment_id, user_id, amount, currency, \
     subscription_duration_months, status, provider_payment_id, created_at";

fn row_to_record(row: &PgRow) -> PaymentRecord {
    PaymentRecord {
        payment_id: row.get("payment_id"),
        user_id: row.get("user_id"),
        amount: row.get("amount"),
        currency: row.get("currency"),
        subscription_duration_months: row.get("subscription_duration_months"),
        status: row.get::<PaymentStatus, _>("status"),
        provider_payment_id: row.get("provider_payment_id"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl PaymentLedger for PostgresPersistence {
    async fn find_by_id(&self, payment_id: i64) -> AppResult<Option<PaymentRecord>> {
        let query = format!("SELECT {SELECT_COLS} FROM payments WHERE payment_id = $1");
        let row = sqlx::query(&query)
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn find_by_provider_payment_id(
        &self,
        provider_payment_id: &str,
    ) -> AppResult<Option<PaymentRecord>> {
        let query = format!("SELECT {SELECT_COLS} FROM payments WHERE provider_payment_id = $1");
        let row = sqlx::query(&query)
            .bind(provider_payment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn begin_settlement(&self) -> AppResult<Box<dyn SettlementTxn>> {
        let txn = self.pool.begin().await.map_err(AppError::from)?;
        Ok(Box::new(PgSettlementTxn { txn }))
    }
}

/// Settlement transaction backed by a real Postgres transaction.
///
/// Subscription and referral collaborators can downcast through
/// `as_any_mut` and run their statements on [`transaction`] so the whole
/// settlement commits or rolls back as one unit.
///
/// [`transaction`]: PgSettlementTxn::transaction
pub struct PgSettlementTxn {
    txn: Transaction<'static, Postgres>,
}

impl PgSettlementTxn {
    pub fn transaction(&mut self) -> &mut Transaction<'static, Postgres> {
        &mut self.txn
    }
}

#[async_trait]
impl SettlementTxn for PgSettlementTxn {
    async fn mark_succeeded(
        &mut self,
        payment_id: i64,
        provider_payment_id: &str,
    ) -> AppResult<bool> {
        // The status guard makes the flip first-writer-wins under
        // concurrent deliveries of the same callback.
        let result = sqlx::query(
            "UPDATE payments \
             SET provider_payment_id = $2, status = 'succeeded', \
                 updated_at = CURRENT_TIMESTAMP \
             WHERE payment_id = $1 AND status = 'pending'",
        )
        .bind(payment_id)
        .bind(provider_payment_id)
        .execute(&mut *self.txn)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.txn.commit().await.map_err(AppError::from)
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.txn.rollback().await.map_err(AppError::from)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
