use super::{read_decimal, LedgerStore};
use crate::{
    error::{LedgerError, LedgerResult},
    models::Account,
};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Provisioning input. Account creation sits outside the payment engine;
/// this exists for bootstrap and seeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccount {
    pub account_number: String,
    #[serde(default)]
    pub customer_name: String,
    pub emi_due: Decimal,
}

impl NewAccount {
    pub fn new(account_number: impl Into<String>, emi_due: Decimal) -> Self {
        Self {
            account_number: account_number.into(),
            customer_name: String::new(),
            emi_due,
        }
    }

    pub fn named(mut self, customer_name: impl Into<String>) -> Self {
        self.customer_name = customer_name.into();
        self
    }
}

// ── Row-level access, usable inside a caller's transaction ───────────

pub(crate) fn find_due(conn: &Connection, account_number: &str) -> LedgerResult<Option<Decimal>> {
    let due = conn
        .query_row(
            "SELECT emi_due FROM customers WHERE account_number = ?1",
            params![account_number],
            |row| read_decimal(row, 0),
        )
        .optional()?;
    Ok(due)
}

pub(crate) fn write_due(conn: &Connection, account_number: &str, due: Decimal) -> LedgerResult<()> {
    let updated = conn.execute(
        "UPDATE customers SET emi_due = ?1 WHERE account_number = ?2",
        params![due.to_string(), account_number],
    )?;
    if updated == 0 {
        return Err(LedgerError::not_found(account_number));
    }
    Ok(())
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        account_number: row.get(0)?,
        customer_name: row.get(1)?,
        emi_due: read_decimal(row, 2)?,
    })
}

impl LedgerStore {
    // ── Account ───────────────────────────────────────────────────

    pub fn insert_account(&self, account: &NewAccount, created_at: NaiveDateTime) -> LedgerResult<()> {
        if account.account_number.trim().is_empty() {
            return Err(LedgerError::invalid("account_number is required"));
        }
        self.with_retry("insert_account", || {
            let conn = self.connect()?;
            conn.execute(
                "INSERT INTO customers (account_number, customer_name, emi_due, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    account.account_number,
                    account.customer_name,
                    account.emi_due.to_string(),
                    created_at
                ],
            )?;
            Ok(())
        })
    }

    pub fn accounts(&self) -> LedgerResult<Vec<Account>> {
        self.with_retry("accounts", || {
            let conn = self.connect()?;
            let mut stmt = conn.prepare(
                "SELECT account_number, customer_name, emi_due
                 FROM customers ORDER BY account_number ASC",
            )?;
            let rows = stmt.query_map([], account_from_row)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    pub fn account(&self, account_number: &str) -> LedgerResult<Option<Account>> {
        self.with_retry("account", || {
            let conn = self.connect()?;
            let account = conn
                .query_row(
                    "SELECT account_number, customer_name, emi_due
                     FROM customers WHERE account_number = ?1",
                    params![account_number],
                    account_from_row,
                )
                .optional()?;
            Ok(account)
        })
    }

    /// Every account's current due, in no particular order.
    pub fn all_dues(&self) -> LedgerResult<Vec<Decimal>> {
        self.with_retry("all_dues", || {
            let conn = self.connect()?;
            let mut stmt = conn.prepare("SELECT emi_due FROM customers")?;
            let rows = stmt.query_map([], |row| read_decimal(row, 0))?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }
}
