//! The payment ledger transaction engine.
//!
//! One operation: record a payment and move the account's due by the same
//! amount, as a single atomic unit.
//!
//! RULES:
//!   - Input is validated before a connection is taken.
//!   - The write lock is reserved at BEGIN (IMMEDIATE), so the due is read
//!     under the lock and two payments can never compute from the same due.
//!   - Lock contention restarts the whole transaction; nothing is carried
//!     over from a failed attempt.
//!   - Every failure after BEGIN rolls back explicitly before surfacing.

use crate::{
    clock::LedgerClock,
    config::LedgerConfig,
    error::{LedgerError, LedgerResult},
    models::{PaymentReceipt, PaymentRequest, PaymentStatus},
    store::{self, LedgerStore},
};
use rusqlite::{Transaction, TransactionBehavior};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const RECEIPT_MESSAGE: &str = "Payment recorded successfully";

/// Largest accepted payment, in whole currency units. Keeps `due - amount`
/// inside `Decimal`'s range for any due the ledger itself can produce.
pub const MAX_PAYMENT_UNITS: i64 = 1_000_000_000_000_000;

/// Lets a caller abandon an in-flight payment. Checked before BEGIN and
/// again immediately before COMMIT; once COMMIT starts the payment stands.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

pub struct LedgerEngine {
    store: Arc<LedgerStore>,
    clock: Arc<dyn LedgerClock>,
    require_positive_amount: bool,
}

impl LedgerEngine {
    pub fn new(store: Arc<LedgerStore>, clock: Arc<dyn LedgerClock>, config: &LedgerConfig) -> Self {
        Self {
            store,
            clock,
            require_positive_amount: config.require_positive_amount,
        }
    }

    pub fn record_payment(&self, request: &PaymentRequest) -> LedgerResult<PaymentReceipt> {
        self.record_payment_cancellable(request, &CancelToken::new())
    }

    pub fn record_payment_cancellable(
        &self,
        request: &PaymentRequest,
        cancel: &CancelToken,
    ) -> LedgerResult<PaymentReceipt> {
        let (account_number, amount) = self.validate(request)?;
        self.store.with_retry("record_payment", || {
            self.attempt(account_number, amount, cancel)
        })
    }

    fn validate<'r>(&self, request: &'r PaymentRequest) -> LedgerResult<(&'r str, Decimal)> {
        let account_number = request
            .account_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LedgerError::invalid("account_number is required"))?;
        let amount = request
            .amount
            .ok_or_else(|| LedgerError::invalid("amount is required"))?;
        if self.require_positive_amount && amount <= Decimal::ZERO {
            return Err(LedgerError::invalid(format!(
                "amount must be positive, got {amount}"
            )));
        }
        if amount.abs() > Decimal::from(MAX_PAYMENT_UNITS) {
            return Err(LedgerError::invalid(format!(
                "amount {amount} exceeds the limit of {MAX_PAYMENT_UNITS}"
            )));
        }
        Ok((account_number, amount))
    }

    /// One complete transaction on a fresh connection.
    fn attempt(
        &self,
        account_number: &str,
        amount: Decimal,
        cancel: &CancelToken,
    ) -> LedgerResult<PaymentReceipt> {
        if cancel.is_cancelled() {
            return Err(LedgerError::Cancelled);
        }
        let mut conn = self.store.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let receipt = match self.apply(&tx, account_number, amount, cancel) {
            Ok(receipt) => receipt,
            Err(err) => {
                rollback(tx, account_number, &err);
                return Err(err);
            }
        };
        // A failed COMMIT leaves the transaction open; dropping it rolls back.
        if let Err(e) = tx.commit() {
            log::warn!("commit for {account_number} failed: {e}");
            return Err(e.into());
        }

        log::info!(
            "payment {} committed: account={} amount={} new_due={}",
            receipt.payment.id,
            account_number,
            amount,
            receipt.new_balance
        );
        Ok(receipt)
    }

    fn apply(
        &self,
        tx: &Transaction<'_>,
        account_number: &str,
        amount: Decimal,
        cancel: &CancelToken,
    ) -> LedgerResult<PaymentReceipt> {
        let current_due = store::find_due(tx, account_number)?
            .ok_or_else(|| LedgerError::not_found(account_number))?;

        // Only reachable for dues provisioned at the edge of Decimal's range.
        let new_due = current_due.checked_sub(amount).ok_or_else(|| {
            LedgerError::invalid(format!("amount {amount} overflows due {current_due}"))
        })?;

        let payment = store::insert_payment(
            tx,
            account_number,
            amount,
            PaymentStatus::Success,
            self.clock.now(),
        )?;
        store::write_due(tx, account_number, new_due)?;

        if cancel.is_cancelled() {
            return Err(LedgerError::Cancelled);
        }

        Ok(PaymentReceipt {
            message: RECEIPT_MESSAGE.to_string(),
            payment,
            new_balance: new_due,
        })
    }
}

fn rollback(tx: Transaction<'_>, account_number: &str, cause: &LedgerError) {
    if cause.is_contention() {
        log::debug!("payment for {account_number} rolled back on contention: {cause}");
    } else {
        log::warn!("payment for {account_number} rolled back: {cause}");
    }
    if let Err(e) = tx.rollback() {
        // The connection is dropped next; SQLite discards the open transaction with it.
        log::warn!("rollback for {account_number} failed: {e}");
    }
}
