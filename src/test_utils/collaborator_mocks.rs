use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        ActivationResult, NotificationDispatcher, PaymentSuccessNotice, ReferralBonusEngine,
        ReferralBonusResult, SettlementTxn, SubscriptionActivator,
    },
};

/// Records `(user_id, months, payment_id)` per call and replies with a
/// configured result.
pub struct MockSubscriptionActivator {
    result: ActivationResult,
    calls: Mutex<Vec<(i64, i32, i64)>>,
    fail: bool,
}

impl MockSubscriptionActivator {
    pub fn new() -> Self {
        Self::returning(ActivationResult::default())
    }

    pub fn returning(result: ActivationResult) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<(i64, i32, i64)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionActivator for MockSubscriptionActivator {
    async fn activate_subscription(
        &self,
        _txn: &mut dyn SettlementTxn,
        user_id: i64,
        months: i32,
        _amount: Decimal,
        payment_id: i64,
    ) -> AppResult<ActivationResult> {
        self.calls.lock().unwrap().push((user_id, months, payment_id));
        if self.fail {
            return Err(AppError::Internal("activation failed".into()));
        }
        Ok(self.result.clone())
    }
}

pub struct MockReferralBonusEngine {
    result: Option<ReferralBonusResult>,
    calls: Mutex<Vec<(i64, i32, i64)>>,
    fail: bool,
}

impl MockReferralBonusEngine {
    /// No referral relationship by default.
    pub fn new() -> Self {
        Self {
            result: None,
            calls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn returning(result: ReferralBonusResult) -> Self {
        Self {
            result: Some(result),
            ..Self::new()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<(i64, i32, i64)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReferralBonusEngine for MockReferralBonusEngine {
    async fn apply_bonuses_for_payment(
        &self,
        _txn: &mut dyn SettlementTxn,
        user_id: i64,
        months: i32,
        payment_id: i64,
    ) -> AppResult<Option<ReferralBonusResult>> {
        self.calls.lock().unwrap().push((user_id, months, payment_id));
        if self.fail {
            return Err(AppError::Internal("referral bonus failed".into()));
        }
        Ok(self.result.clone())
    }
}

pub struct MockNotificationDispatcher {
    user_notices: Mutex<Vec<(i64, PaymentSuccessNotice)>>,
    admin_notices: Mutex<Vec<(i64, Decimal, String, i32)>>,
    fail: bool,
}

impl MockNotificationDispatcher {
    pub fn new() -> Self {
        Self {
            user_notices: Mutex::new(Vec::new()),
            admin_notices: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn user_notices(&self) -> Vec<(i64, PaymentSuccessNotice)> {
        self.user_notices.lock().unwrap().clone()
    }

    pub fn admin_notices(&self) -> Vec<(i64, Decimal, String, i32)> {
        self.admin_notices.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for MockNotificationDispatcher {
    async fn notify_user_payment_success(
        &self,
        user_id: i64,
        notice: &PaymentSuccessNotice,
    ) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Internal("delivery failed".into()));
        }
        self.user_notices
            .lock()
            .unwrap()
            .push((user_id, notice.clone()));
        Ok(())
    }

    async fn notify_payment_received(
        &self,
        user_id: i64,
        amount: Decimal,
        currency: &str,
        months: i32,
    ) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Internal("delivery failed".into()));
        }
        self.admin_notices
            .lock()
            .unwrap()
            .push((user_id, amount, currency.to_string(), months));
        Ok(())
    }
}
