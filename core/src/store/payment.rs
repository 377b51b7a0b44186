use super::{read_decimal, LedgerStore};
use crate::{
    error::LedgerResult,
    models::{Payment, PaymentStatus},
};
use chrono::NaiveDateTime;
use rusqlite::{params, types::Type, Connection, Row};
use rust_decimal::Decimal;

const PAYMENT_COLUMNS: &str =
    "id, customer_account_number, payment_amount, status, payment_date";

pub(crate) fn insert_payment(
    conn: &Connection,
    account_number: &str,
    amount: Decimal,
    status: PaymentStatus,
    payment_date: NaiveDateTime,
) -> LedgerResult<Payment> {
    conn.execute(
        "INSERT INTO payments (customer_account_number, payment_amount, status, payment_date)
         VALUES (?1, ?2, ?3, ?4)",
        params![account_number, amount.to_string(), status.as_str(), payment_date],
    )?;
    Ok(Payment {
        id: conn.last_insert_rowid(),
        customer_account_number: account_number.to_string(),
        payment_amount: amount,
        status,
        payment_date,
    })
}

fn payment_from_row(row: &Row<'_>) -> rusqlite::Result<Payment> {
    let status: String = row.get(3)?;
    Ok(Payment {
        id: row.get(0)?,
        customer_account_number: row.get(1)?,
        payment_amount: read_decimal(row, 2)?,
        status: status
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
        payment_date: row.get(4)?,
    })
}

impl LedgerStore {
    // ── Payment ───────────────────────────────────────────────────

    /// Full ledger, newest first. Equal timestamps fall back to insertion order.
    pub fn payments(&self) -> LedgerResult<Vec<Payment>> {
        self.with_retry("payments", || {
            let conn = self.connect()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {PAYMENT_COLUMNS} FROM payments
                 ORDER BY payment_date DESC, id DESC"
            ))?;
            let rows = stmt.query_map([], payment_from_row)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    /// One account's payments, newest first. Unknown accounts yield an empty list.
    pub fn payments_for_account(&self, account_number: &str) -> LedgerResult<Vec<Payment>> {
        self.with_retry("payments_for_account", || {
            let conn = self.connect()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {PAYMENT_COLUMNS} FROM payments
                 WHERE customer_account_number = ?1
                 ORDER BY payment_date DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![account_number], payment_from_row)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    /// Amounts of successful payments dated in `[from, until)`.
    pub fn amounts_between(
        &self,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> LedgerResult<Vec<Decimal>> {
        self.with_retry("amounts_between", || {
            let conn = self.connect()?;
            let mut stmt = conn.prepare(
                "SELECT payment_amount FROM payments
                 WHERE payment_date >= ?1 AND payment_date < ?2 AND status = ?3",
            )?;
            let rows = stmt.query_map(
                params![from, until, PaymentStatus::Success.as_str()],
                |row| read_decimal(row, 0),
            )?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    pub fn payment_count(&self) -> LedgerResult<i64> {
        self.with_retry("payment_count", || {
            let conn = self.connect()?;
            let count = conn.query_row("SELECT COUNT(*) FROM payments", [], |row| row.get(0))?;
            Ok(count)
        })
    }
}
