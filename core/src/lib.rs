//! EMI ledger: records installment payments against customer accounts,
//! keeps each account's due consistent with its payment history, and
//! summarises collections.

pub mod analytics;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod query;
pub mod service;
pub mod store;
pub mod types;

pub use analytics::AnalyticsAggregator;
pub use clock::{FixedClock, LedgerClock, SystemClock};
pub use config::LedgerConfig;
pub use engine::{CancelToken, LedgerEngine};
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use models::{Account, CollectionSummary, Payment, PaymentReceipt, PaymentRequest, PaymentStatus};
pub use query::QueryFacade;
pub use service::{LedgerCommand, LedgerService};
pub use store::{LedgerStore, NewAccount};
