//! Read accessors over the account and payment stores.

use crate::{
    error::{LedgerError, LedgerResult},
    models::{Account, Payment},
    store::LedgerStore,
};
use std::sync::Arc;

pub struct QueryFacade {
    store: Arc<LedgerStore>,
}

impl QueryFacade {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// All accounts. Callers must not rely on the order.
    pub fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.store.accounts()
    }

    pub fn get_account(&self, account_number: &str) -> LedgerResult<Account> {
        let account_number = account_number.trim();
        self.store
            .account(account_number)?
            .ok_or_else(|| LedgerError::not_found(account_number))
    }

    /// Newest first.
    pub fn list_payments(&self) -> LedgerResult<Vec<Payment>> {
        self.store.payments()
    }

    /// Newest first; empty when the account has no payments or does not exist.
    pub fn list_payments_for_account(&self, account_number: &str) -> LedgerResult<Vec<Payment>> {
        self.store.payments_for_account(account_number.trim())
    }
}
