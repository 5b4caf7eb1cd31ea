use std::{
    any::Any,
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{PaymentLedger, SettlementTxn},
    domain::entities::payment::{PaymentRecord, PaymentStatus},
};

/// In-memory [`PaymentLedger`] keyed by payment id.
///
/// Settlement transactions stage their write and only apply it on commit,
/// so rollback paths can assert the record is untouched.
#[derive(Default)]
pub struct InMemoryPaymentLedger {
    records: Arc<Mutex<HashMap<i64, PaymentRecord>>>,
}

impl InMemoryPaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<PaymentRecord>) -> Self {
        let map = records.into_iter().map(|r| (r.payment_id, r)).collect();
        Self {
            records: Arc::new(Mutex::new(map)),
        }
    }

    pub fn get(&self, payment_id: i64) -> Option<PaymentRecord> {
        self.records.lock().unwrap().get(&payment_id).cloned()
    }
}

#[async_trait]
impl PaymentLedger for InMemoryPaymentLedger {
    async fn find_by_id(&self, payment_id: i64) -> AppResult<Option<PaymentRecord>> {
        Ok(self.get(payment_id))
    }

    async fn find_by_provider_payment_id(
        &self,
        provider_payment_id: &str,
    ) -> AppResult<Option<PaymentRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .find(|r| r.provider_payment_id.as_deref() == Some(provider_payment_id))
            .cloned())
    }

    async fn begin_settlement(&self) -> AppResult<Box<dyn SettlementTxn>> {
        Ok(Box::new(InMemorySettlementTxn {
            records: self.records.clone(),
            staged: None,
        }))
    }
}

pub struct InMemorySettlementTxn {
    records: Arc<Mutex<HashMap<i64, PaymentRecord>>>,
    staged: Option<(i64, String)>,
}

#[async_trait]
impl SettlementTxn for InMemorySettlementTxn {
    async fn mark_succeeded(
        &mut self,
        payment_id: i64,
        provider_payment_id: &str,
    ) -> AppResult<bool> {
        let records = self.records.lock().unwrap();
        match records.get(&payment_id) {
            None => Err(AppError::NotFound),
            Some(record) if record.status == PaymentStatus::Pending => {
                self.staged = Some((payment_id, provider_payment_id.to_string()));
                Ok(true)
            }
            Some(_) => Ok(false),
        }
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        if let Some((payment_id, provider_payment_id)) = self.staged {
            let mut records = self.records.lock().unwrap();
            if let Some(record) = records.get_mut(&payment_id) {
                record.status = PaymentStatus::Succeeded;
                record.provider_payment_id = Some(provider_payment_id);
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
