//! Command surface for the ledger: the operations an outer transport exposes,
//! as a serde-tagged enum, plus the mapping of results and errors to JSON.

use crate::{
    analytics::AnalyticsAggregator,
    clock::LedgerClock,
    config::LedgerConfig,
    engine::LedgerEngine,
    error::{LedgerError, LedgerResult},
    models::PaymentRequest,
    query::QueryFacade,
    store::LedgerStore,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;

/// All client-issued commands.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerCommand {
    ListAccounts,
    GetAccount {
        account_number: String,
    },
    RecordPayment {
        #[serde(default)]
        account_number: Option<String>,
        /// Number or numeric string. Anything else is rejected in validation.
        #[serde(default)]
        amount: Option<Value>,
    },
    ListPayments,
    ListPaymentsForAccount {
        account_number: String,
    },
    GetAnalytics,
}

pub struct LedgerService {
    store: Arc<LedgerStore>,
    engine: LedgerEngine,
    queries: QueryFacade,
    analytics: AnalyticsAggregator,
}

impl LedgerService {
    pub fn new(store: Arc<LedgerStore>, clock: Arc<dyn LedgerClock>, config: &LedgerConfig) -> Self {
        Self {
            engine: LedgerEngine::new(store.clone(), clock.clone(), config),
            queries: QueryFacade::new(store.clone()),
            analytics: AnalyticsAggregator::new(store.clone(), clock),
            store,
        }
    }

    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }

    pub fn engine(&self) -> &LedgerEngine {
        &self.engine
    }

    pub fn queries(&self) -> &QueryFacade {
        &self.queries
    }

    pub fn analytics(&self) -> &AnalyticsAggregator {
        &self.analytics
    }

    pub fn execute(&self, command: LedgerCommand) -> LedgerResult<Value> {
        let value = match command {
            LedgerCommand::ListAccounts => serde_json::to_value(self.queries.list_accounts()?)?,
            LedgerCommand::GetAccount { account_number } => {
                serde_json::to_value(self.queries.get_account(&account_number)?)?
            }
            LedgerCommand::RecordPayment {
                account_number,
                amount,
            } => {
                let request = PaymentRequest {
                    account_number,
                    amount: amount.as_ref().map(parse_amount).transpose()?,
                };
                serde_json::to_value(self.engine.record_payment(&request)?)?
            }
            LedgerCommand::ListPayments => serde_json::to_value(self.queries.list_payments()?)?,
            LedgerCommand::ListPaymentsForAccount { account_number } => {
                serde_json::to_value(self.queries.list_payments_for_account(&account_number)?)?
            }
            LedgerCommand::GetAnalytics => serde_json::to_value(self.analytics.summary()?)?,
        };
        Ok(value)
    }

    /// Handle one JSON request line. Never fails: errors become
    /// `{"error": {"kind": ..., "message": ...}}`.
    pub fn handle_line(&self, line: &str) -> Value {
        let command: LedgerCommand = match serde_json::from_str(line.trim()) {
            Ok(command) => command,
            Err(e) => return error_body(&LedgerError::invalid(format!("malformed request: {e}"))),
        };
        match self.execute(command) {
            Ok(value) => value,
            Err(err) => error_body(&err),
        }
    }
}

pub fn error_body(err: &LedgerError) -> Value {
    json!({
        "error": {
            "kind": err.kind().as_str(),
            "message": err.to_string(),
        }
    })
}

/// Null and blank strings count as missing.
fn parse_amount(value: &Value) -> LedgerResult<Decimal> {
    let parsed = match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string())),
        Value::String(s) if !s.trim().is_empty() => Decimal::from_str(s.trim()),
        Value::Null | Value::String(_) => {
            return Err(LedgerError::invalid("amount is required"));
        }
        other => return Err(LedgerError::invalid(format!("amount must be numeric, got {other}"))),
    };
    parsed.map_err(|_| LedgerError::invalid(format!("amount must be numeric, got {value}")))
}
