//! Shared primitive types used across the ledger.

/// The customer-facing account identifier. Primary key of `customers`.
pub type AccountNumber = String;

/// Row id of a committed payment. Assigned by the store, strictly increasing.
pub type PaymentId = i64;
