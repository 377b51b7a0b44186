//! Ledger records and the request/response shapes of the public operations.

use crate::types::{AccountNumber, PaymentId};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A customer account and its outstanding installment due.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_number: AccountNumber,
    #[serde(default)]
    pub customer_name: String,
    /// Negative when the customer has overpaid.
    pub emi_due: Decimal,
}

/// A committed payment. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub customer_account_number: AccountNumber,
    pub payment_amount: Decimal,
    pub status: PaymentStatus,
    pub payment_date: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Success,
    /// Never written by the engine; read back from rows other tools insert.
    Pending,
    /// Never written by the engine; read back from rows other tools insert.
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Failed  => "FAILED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown payment status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => Ok(PaymentStatus::Success),
            "PENDING" => Ok(PaymentStatus::Pending),
            "FAILED"  => Ok(PaymentStatus::Failed),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Input to `LedgerEngine::record_payment`. Both fields are optional so that
/// incomplete requests reach validation instead of failing in the transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    #[serde(default)]
    pub account_number: Option<AccountNumber>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

impl PaymentRequest {
    pub fn new(account_number: impl Into<AccountNumber>, amount: Decimal) -> Self {
        Self {
            account_number: Some(account_number.into()),
            amount: Some(amount),
        }
    }
}

/// Result of a committed payment transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub message: String,
    pub payment: Payment,
    pub new_balance: Decimal,
}

/// Dashboard figures. The two sums come from separate reads and are not a
/// joint snapshot: a payment committing between them can appear in one
/// figure and not the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub collected_today: Decimal,
    pub pending_total: Decimal,
}
