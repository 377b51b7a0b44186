use rusqlite::ErrorCode;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Account '{account_number}' not found")]
    AccountNotFound { account_number: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Payment cancelled before commit")]
    Cancelled,

    #[error("Ledger store is closed")]
    StoreClosed,
}

/// The outcome classes a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    StorageError,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound        => "not_found",
            ErrorKind::StorageError    => "storage_error",
            ErrorKind::Cancelled       => "cancelled",
        }
    }
}

impl LedgerError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        LedgerError::InvalidArgument(reason.into())
    }

    pub fn not_found(account_number: &str) -> Self {
        LedgerError::AccountNotFound {
            account_number: account_number.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidArgument(_)       => ErrorKind::InvalidArgument,
            LedgerError::AccountNotFound { .. }   => ErrorKind::NotFound,
            LedgerError::Cancelled                => ErrorKind::Cancelled,
            LedgerError::Database(_)
            | LedgerError::Serialization(_)
            | LedgerError::StoreClosed            => ErrorKind::StorageError,
        }
    }

    /// True when the store refused the operation because another connection
    /// holds a conflicting lock. The whole unit of work may be retried.
    pub fn is_contention(&self) -> bool {
        match self {
            LedgerError::Database(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
